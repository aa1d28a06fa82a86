/// Memory back-end for an 8080 machine.
///
/// The CPU masks every address to 16 bits before calling. `stack_request` is
/// true for the stack traffic of PUSH/POP/XTHL and the push/pop halves of
/// CALL/RET/RST (conditional variants included), and false for everything
/// else, instruction fetches included. Back-ends that do not care about the
/// distinction can simply ignore it.
pub trait Memory {
    fn read(&mut self, addr: u16, stack_request: bool) -> u8;
    fn write(&mut self, addr: u16, value: u8, stack_request: bool);
}

/// IO back-end for an 8080 machine.
///
/// `input`/`output` service the IN and OUT instructions. `interrupt` is a
/// notification, not a request: the CPU calls it when the interrupt-enable
/// flip-flop changes state (DI, the delayed enable after EI, and interrupt
/// acknowledgement), so the back-end always knows whether raising an
/// interrupt would be acknowledged.
pub trait Io {
    fn input(&mut self, port: u8) -> u8;
    fn output(&mut self, port: u8, value: u8);
    fn interrupt(&mut self, enabled: bool);
}
