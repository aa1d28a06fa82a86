use log::{debug, info};
use thiserror::Error;
use typed_builder::TypedBuilder;
use vm80_core::{Cpu, Io, Memory};

/// Total addressable memory size (64 KiB).
const MEMORY_SIZE: usize = 0x10000;

/// CP/M transient program area: `.COM` images load and start here.
pub const TPA_START: u16 = 0x0100;

/// BDOS entry point. The loader plants a RET here and the run loop services
/// the call before the CPU executes it.
pub const BDOS_ENTRY: u16 = 0x0005;

/// Warm-boot vector; a program transferring control here has finished.
const WARM_BOOT: u16 = 0x0000;

const OP_RET: u8 = 0xc9;
const OP_HLT: u8 = 0x76;

/// BDOS function 2: console output of the byte in E.
const BDOS_C_WRITE: u8 = 2;
/// BDOS function 9: print the '$'-terminated string starting at DE.
const BDOS_C_WRITESTR: u8 = 9;

/// Flat 64 KiB memory back-end.
///
/// The CP/M machine has no banking or memory-mapped IO, so stack traffic is
/// not treated differently from any other access.
pub struct FlatMemory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self {
            bytes: Box::new([0; MEMORY_SIZE]),
        }
    }
}

impl FlatMemory {
    pub fn at(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    pub fn set(&mut self, addr: u16, value: u8) {
        self.bytes[addr as usize] = value;
    }
}

impl Memory for FlatMemory {
    fn read(&mut self, addr: u16, _stack_request: bool) -> u8 {
        self.bytes[addr as usize]
    }

    fn write(&mut self, addr: u16, value: u8, _stack_request: bool) {
        self.bytes[addr as usize] = value;
    }
}

/// Console-oriented IO back-end.
///
/// The diagnostic binaries drive the console through BDOS calls rather than
/// IN/OUT, so ports read as zero and writes are only logged. The interrupt
/// notification is latched so the host can observe the enable state.
#[derive(Default)]
pub struct ConsoleIo {
    interrupts_enabled: bool,
}

impl ConsoleIo {
    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }
}

impl Io for ConsoleIo {
    fn input(&mut self, _port: u8) -> u8 {
        0
    }

    fn output(&mut self, port: u8, value: u8) {
        debug!("OUT {:02x} <- {:02x}", port, value);
    }

    fn interrupt(&mut self, enabled: bool) {
        self.interrupts_enabled = enabled;
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("program image is empty")]
    Empty,
    #[error("program image of {0} bytes does not fit in the transient program area")]
    TooLarge(usize),
}

/// Options for a single [`CpmMachine::run`].
#[derive(TypedBuilder)]
pub struct RunConfig {
    /// Echo console output to stdout as it is produced.
    #[builder(default)]
    pub echo: bool,
    /// Upper bound on executed instructions. The full instruction-set
    /// exerciser needs a few billion, so the default is deliberately roomy.
    #[builder(default = 10_000_000_000)]
    pub max_instructions: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// How a program run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program transferred control to the warm-boot vector.
    Completed { instructions: u64, cycles: u64 },
    /// The CPU reached a HLT instruction.
    Halted { instructions: u64, cycles: u64 },
    /// The instruction budget ran out before the program ended.
    BudgetExceeded { instructions: u64, cycles: u64 },
}

/// A loaded CP/M machine: CPU, memory, console, and the BDOS shim.
pub struct CpmMachine {
    cpu: Cpu<FlatMemory, ConsoleIo>,
    output: Vec<u8>,
}

impl Default for CpmMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl CpmMachine {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(FlatMemory::default(), ConsoleIo::default()),
            output: Vec::new(),
        }
    }

    /// Place a `.COM` image in the transient program area and point the CPU
    /// at its entry. A RET is planted at the BDOS entry so that trapped calls
    /// return to the program on their own.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), LoadError> {
        if image.is_empty() {
            return Err(LoadError::Empty);
        }
        let start = usize::from(TPA_START);
        if start + image.len() > MEMORY_SIZE {
            return Err(LoadError::TooLarge(image.len()));
        }
        let mem = self.cpu.memory_mut();
        mem.bytes[start..start + image.len()].copy_from_slice(image);
        mem.set(BDOS_ENTRY, OP_RET);
        self.cpu.jump(TPA_START);
        info!("loaded {} byte image at {:04x}", image.len(), TPA_START);
        Ok(())
    }

    /// Everything the program printed through the BDOS shim so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn cpu(&self) -> &Cpu<FlatMemory, ConsoleIo> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu<FlatMemory, ConsoleIo> {
        &mut self.cpu
    }

    /// Drive the CPU until the program finishes, halts, or exhausts the
    /// instruction budget.
    pub fn run(&mut self, config: &RunConfig) -> RunOutcome {
        let mut instructions = 0u64;
        let mut cycles = 0u64;
        loop {
            let pc = self.cpu.pc();
            if pc == WARM_BOOT {
                info!(
                    "program completed after {} instructions ({} T-states)",
                    instructions, cycles
                );
                return RunOutcome::Completed {
                    instructions,
                    cycles,
                };
            }
            if self.cpu.memory().at(pc) == OP_HLT {
                info!("CPU halted at {:04x}", pc);
                return RunOutcome::Halted {
                    instructions,
                    cycles,
                };
            }
            if pc == BDOS_ENTRY {
                self.bdos_call(config.echo);
            }
            if instructions == config.max_instructions {
                return RunOutcome::BudgetExceeded {
                    instructions,
                    cycles,
                };
            }
            cycles += u64::from(self.cpu.instruction());
            instructions += 1;
        }
    }

    /// Service the BDOS call selected by register C. Control flow is handled
    /// by the RET planted at the entry point; this only performs the console
    /// side effect.
    fn bdos_call(&mut self, echo: bool) {
        match self.cpu.c() {
            BDOS_C_WRITE => {
                let byte = self.cpu.e();
                self.emit(byte, echo);
            }
            BDOS_C_WRITESTR => {
                let mut addr = self.cpu.de();
                // An unterminated string cannot scan more than the whole
                // address space once.
                for _ in 0..MEMORY_SIZE {
                    let byte = self.cpu.memory().at(addr);
                    if byte == b'$' {
                        break;
                    }
                    self.emit(byte, echo);
                    addr = addr.wrapping_add(1);
                }
            }
            other => debug!("unhandled BDOS function {}", other),
        }
    }

    fn emit(&mut self, byte: u8, echo: bool) {
        self.output.push(byte);
        if echo {
            print!("{}", byte as char);
        }
    }
}
