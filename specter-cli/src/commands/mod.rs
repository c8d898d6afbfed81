//! Command implementations for the specter CLI.

pub mod batch;
pub mod file;

use specter_core::{ObfuscationConfig, PerturbationConfig};

use crate::Cli;

/// Obfuscation settings for this invocation: env defaults plus CLI overrides.
pub fn obfuscation_config(cli: &Cli) -> ObfuscationConfig {
    let defaults = ObfuscationConfig::default();
    ObfuscationConfig {
        perturbation: PerturbationConfig {
            seed: cli.seed.or(defaults.perturbation.seed),
            ..defaults.perturbation
        },
        ..defaults
    }
}
