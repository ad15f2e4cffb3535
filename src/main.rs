use anyhow::Context;
use clap::Parser;
use netns_attrs::utils::{logger, validation::Validate};
use netns_attrs::{
    CliConfig, Directory, LocalNamespaceManager, NetnsError, NetnsModule, TomlConfig, Viewer,
};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => TomlConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path))?,
        None => TomlConfig::default(),
    };

    let verbose = cli.verbose || config.logging.verbose;
    if config.logging.json {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    let writes = cli.parsed_writes()?;
    let hierarchy = &config.hierarchy;

    let kernel = Directory::root(&hierarchy.parent);
    let manager = Arc::new(LocalNamespaceManager::new());
    if cli.fail_registration {
        manager.fail_next_registration();
    }

    let module = match NetnsModule::start(hierarchy, &kernel, manager.clone()) {
        Ok(module) => module,
        Err(e) => {
            tracing::error!("❌ Module start failed: {} (Category: {:?})", e, e.category());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("{} entries left under '{}'", kernel.child_count(), kernel.name());
            std::process::exit(3);
        }
    };
    let probe = module.hierarchy().probe();

    for name in &cli.namespaces {
        let net = manager.create_namespace(name)?;
        tracing::info!("created namespace '{}' as {}", name, net.id());
    }

    let attribute_path = format!("{}/{}/{}", hierarchy.top, hierarchy.node, hierarchy.attribute);
    for (name, text) in &writes {
        let net = manager.find(name).ok_or_else(|| NetnsError::NotFound {
            path: format!("namespace '{}'", name),
        })?;
        let viewer = Viewer::owner(net.id());
        match module.hierarchy().write_attribute(&viewer, &attribute_path, text) {
            Ok(count) => tracing::info!("wrote {} bytes to {} in '{}'", count, attribute_path, name),
            Err(e) => eprintln!("❌ write to '{}' failed: {}", name, e.user_friendly_message()),
        }
    }

    for net in manager.namespaces() {
        let viewer = Viewer::owner(net.id());
        if cli.json {
            let snapshot = module.hierarchy().snapshot(&viewer);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else {
            let value = module.hierarchy().read_attribute(&viewer, &attribute_path)?;
            println!(
                "{} ({}): {}/{}/{} = {}",
                net.name(),
                net.id(),
                kernel.name(),
                hierarchy.collection,
                attribute_path,
                value.trim_end()
            );
        }
    }

    for net in manager.namespaces() {
        manager.destroy_namespace(net.id())?;
    }

    module.stop();
    if probe.is_released() && kernel.child_count() == 0 {
        println!("✅ module stopped, hierarchy released");
    } else {
        anyhow::bail!("hierarchy still referenced after stop");
    }

    Ok(())
}
