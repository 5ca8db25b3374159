use swc_core::{
    ecma::{ast::Program, visit::VisitMutWith},
    plugin::{plugin_transform, proxies::TransformPluginProgramMetadata},
};
use tracing::warn;

pub mod config;
pub mod detect;
pub mod helper;
pub mod inject;
mod transform;

#[cfg(test)]
mod test_utils;

pub use config::{ConfigError, Framework, PluginConfig};
pub use detect::{classify, Candidate, ClickIntent};
pub use helper::{helper_declaration, HELPER_NAME};
pub use transform::AutoCursorTransform;

// -----------------------------------------------------------------------------
// Config
// -----------------------------------------------------------------------------

/// Host config is optional; a config that does not parse falls back to the
/// default framework instead of failing the build.
fn load_config(raw: Option<String>) -> PluginConfig {
    let Some(raw) = raw else {
        return PluginConfig::default();
    };
    PluginConfig::from_json(&raw).unwrap_or_else(|err| {
        warn!(error = %err, config = %raw, "ignoring auto-cursor plugin config");
        PluginConfig::default()
    })
}

// -----------------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------------

#[plugin_transform]
pub fn process_transform(mut program: Program, metadata: TransformPluginProgramMetadata) -> Program {
    let config = load_config(metadata.get_transform_plugin_config());
    program.visit_mut_with(&mut AutoCursorTransform::new(config.framework));
    program
}
