//! `weave passes`: list the cleanup passes.

use weave_config::WeaveConfig;
use weave_opt::CleanupRegistry;

/// Runs the `weave passes` command.
pub fn run(config: &WeaveConfig) -> Result<i32, Box<dyn std::error::Error>> {
    print!("{}", listing(config));
    Ok(0)
}

/// One line per pass, in run order, marking those disabled by `config`.
fn listing(config: &WeaveConfig) -> String {
    let mut registry = CleanupRegistry::with_builtin_passes();
    for name in &config.optimizer.disabled_passes {
        registry.disable(name);
    }
    let mut out = String::new();
    for pass in registry.passes() {
        let marker = if registry.is_enabled(pass.name()) {
            ""
        } else {
            " (disabled)"
        };
        out.push_str(&format!("{:<20} {}{marker}\n", pass.name(), pass.description()));
    }
    out
}
