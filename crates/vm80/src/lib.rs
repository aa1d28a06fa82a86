use anyhow::{bail, Context, Result};
use vm80_cpm::{CpmMachine, RunConfig, RunOutcome};

/// Load a `.COM` image and run it to completion, echoing console output.
pub fn run(image_path: &str) -> Result<()> {
    let image = std::fs::read(image_path)
        .with_context(|| format!("failed to read program image {}", image_path))?;

    let mut machine = CpmMachine::new();
    machine.load_image(&image)?;

    let config = RunConfig::builder().echo(true).build();
    let outcome = machine.run(&config);
    // Diagnostic binaries rarely end their last message with a newline.
    println!();

    match outcome {
        RunOutcome::Completed {
            instructions,
            cycles,
        } => {
            log::info!(
                "completed after {} instructions ({} T-states)",
                instructions,
                cycles
            );
            Ok(())
        }
        RunOutcome::Halted {
            instructions,
            cycles,
        } => bail!(
            "CPU halted after {} instructions ({} T-states)",
            instructions,
            cycles
        ),
        RunOutcome::BudgetExceeded { instructions, .. } => {
            bail!("instruction budget exhausted after {}", instructions)
        }
    }
}
