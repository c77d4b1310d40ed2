use clap::{Parser, Subcommand};

use crate::{
    cli::reference::ReferenceArgs,
    pipeline::features::AugmentedFeatureTable,
    prelude::*,
    tables::build_labels_table,
};

#[derive(Parser)]
pub struct BurrowArgs {
    #[command(subcommand)]
    command: BurrowCommand,
}

impl BurrowArgs {
    pub fn run(self) -> Result {
        match self.command {
            BurrowCommand::Labels(args) => args.run(),
            BurrowCommand::Features => {
                for (index, name) in AugmentedFeatureTable::header().into_iter().enumerate() {
                    println!("{index:>2} {name}");
                }
                Ok(())
            }
        }
    }
}

#[derive(Subcommand)]
enum BurrowCommand {
    /// List the labels accepted in scenario files, with their model codes.
    Labels(BurrowLabelsArgs),

    /// Print the feature column order expected by the model artifacts.
    Features,
}

#[derive(Parser)]
struct BurrowLabelsArgs {
    #[clap(flatten)]
    reference: ReferenceArgs,

    /// Only list this category.
    #[clap(long, env = "CATEGORY")]
    category: Option<String>,
}

impl BurrowLabelsArgs {
    #[instrument(skip_all)]
    fn run(self) -> Result {
        let mut mapping = self.reference.load()?;
        if let Some(category) = self.category {
            let labels = mapping.labels(&category)?.clone();
            mapping = [(category, labels)].into_iter().collect();
        }
        println!("{}", build_labels_table(&mapping));
        Ok(())
    }
}
