use ::std::path::PathBuf;

use ::anyhow::{Context, Result};
use ::argh::FromArgs;

/// njoy-core: distributed input-remapping engine
#[derive(FromArgs, PartialEq, Debug)]
struct LauncherOpts {
    #[argh(option, short = 'c', default = "PathBuf::from(\"/etc/njoy/njoy.toml\")")]
    /// path to the engine's TOML configuration (default: /etc/njoy/njoy.toml)
    config: PathBuf,

    #[argh(option, short = 'd')]
    /// path to the nJoyDesign text file describing devices and virtual controls
    design: PathBuf,
}

fn main() -> Result<()> {
    ::env_logger::init();
    let opts: LauncherOpts = ::argh::from_env();

    let config_text = ::std::fs::read_to_string(&opts.config)
        .with_context(|| format!("reading config file {}", opts.config.display()))?;
    let config: ::njoy_config::EngineConfig =
        ::toml::from_str(&config_text).context("parsing engine config")?;

    let design_text = ::std::fs::read_to_string(&opts.design)
        .with_context(|| format!("reading design file {}", opts.design.display()))?;
    let design = ::njoy_design::parse_design(&design_text).context("parsing design")?;

    ::log::info!("loaded design {:?} with {} physical device(s)", design.name, design.devices.len());

    let engine = ::std::sync::Arc::new(::njoy_core::Engine::new(
        &config,
        design,
        ::njoy_core::ProcessorRegistry::new(),
    )?);
    engine.run().context("engine run loop exited")?;
    Ok(())
}
