use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use modelclay::{
    Component, CompilerConfig, Identity, MemoryComponentStore, Publisher,
};

#[derive(Parser)]
#[command(name = "modelclay")]
#[command(about = "Compile clinical data-model definitions into schema documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a model description and print the schema document and a
    /// synthesized example instance
    Compile {
        /// Model description: a JSON array of components in dependency
        /// order, the data-model root last. Reference ids are file-local
        /// and are replaced by published identities during loading.
        input: PathBuf,
        /// Cluster-visit ceiling before a walk is treated as cyclic
        #[arg(long, default_value_t = 100)]
        ceiling: usize,
        /// Fixed seed for the example-instance synthesizer
        #[arg(long)]
        seed: Option<u64>,
        /// Print only the schema document
        #[arg(long)]
        schema_only: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile {
            input,
            ceiling,
            seed,
            schema_only,
        } => compile(input, ceiling, seed, schema_only),
    }
}

fn compile(
    input: PathBuf,
    ceiling: usize,
    seed: Option<u64>,
    schema_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&input)?;
    let mut components: Vec<Component> = serde_json::from_str(&text)?;
    let root = components
        .pop()
        .ok_or("model description contains no components")?;

    let mut config = CompilerConfig::default().with_cluster_visit_ceiling(ceiling);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let store = MemoryComponentStore::new();
    let publisher = Publisher::with_config(&store, config);

    // Publish dependencies in listed order, swapping each file-local id
    // for the identity minted at publish time.
    let mut published: HashMap<Identity, Identity> = HashMap::new();
    for mut component in components {
        let local = component.meta().identity;
        relink(&mut component, &published)?;
        let identity = publisher.publish(store.insert_draft(component))?;
        if let Some(local) = local {
            published.insert(local, identity);
        }
    }

    let mut root = root;
    relink(&mut root, &published)?;
    let output = publisher.publish_model(store.insert_draft(root))?;

    println!("{}", output.document.render());
    if !schema_only {
        println!();
        println!("{}", output.instance.render());
    }
    for warning in &output.instance.warnings {
        eprintln!("warning: {}: {}", warning.label, warning.message);
    }
    Ok(())
}

fn relink(
    component: &mut Component,
    published: &HashMap<Identity, Identity>,
) -> Result<(), Box<dyn std::error::Error>> {
    let label = component.label().to_string();
    for reference in component.references_mut() {
        match published.get(reference) {
            Some(identity) => *reference = *identity,
            None => {
                return Err(format!(
                    "component '{label}' references unknown id {reference}"
                )
                .into());
            }
        }
    }
    Ok(())
}
