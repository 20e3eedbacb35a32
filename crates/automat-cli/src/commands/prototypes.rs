//! Prototype listing command.

use automat_registry::{PrototypeCategory, PrototypeDescriptor, PrototypeRegistry};
use clap::Args;
use serde::Serialize;

#[derive(Args)]
pub struct PrototypesArgs {
    /// Show only prototypes in this category
    #[arg(long, value_name = "CATEGORY")]
    category: Option<String>,

    /// Print the listing as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct PrototypeJson<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    category: &'a str,
}

impl<'a> From<&'a PrototypeDescriptor> for PrototypeJson<'a> {
    fn from(descriptor: &'a PrototypeDescriptor) -> Self {
        Self {
            id: descriptor.id,
            name: descriptor.name,
            description: descriptor.description,
            category: descriptor.category.name(),
        }
    }
}

pub fn run(args: PrototypesArgs) -> anyhow::Result<()> {
    let registry = PrototypeRegistry::new();

    let categories = match &args.category {
        Some(name) => {
            let category = PrototypeCategory::from_name(name).ok_or_else(|| {
                let known: Vec<_> = PrototypeCategory::ALL.iter().map(|c| c.name()).collect();
                anyhow::anyhow!("Unknown category: {} (expected one of {})", name, known.join(", "))
            })?;
            vec![category]
        }
        None => PrototypeCategory::ALL.to_vec(),
    };

    if args.json {
        let listing: Vec<PrototypeJson> = categories
            .iter()
            .flat_map(|&category| registry.in_category(category))
            .map(PrototypeJson::from)
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Available Prototypes");
    println!("====================");
    for category in categories {
        let prototypes = registry.in_category(category);
        if prototypes.is_empty() {
            continue;
        }
        println!();
        println!("{} - {}", category.name(), category.description());
        for prototype in prototypes {
            println!("  {:20} {:20} {}", prototype.id, prototype.name, prototype.description);
        }
    }

    Ok(())
}
