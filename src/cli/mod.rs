//! Command-line front-end. Parsing lives here; all work is delegated to the
//! library.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{EvaluateArgs, PredictArgs, ServeArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "sentiment-head",
    version,
    about = "Train and run a three-class sentiment classifier over sentence embeddings."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Train a classifier head on a labelled CSV and save it as JSON.
    Train(TrainArgs),
    /// Report loss and accuracy of a saved model on a labelled CSV.
    Evaluate(EvaluateArgs),
    /// Classify one or more texts with a saved model.
    Predict(PredictArgs),
    /// Serve predictions over HTTP.
    Serve(ServeArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Command::Train(args) => commands::train(args),
            Command::Evaluate(args) => commands::evaluate(args),
            Command::Predict(args) => commands::predict(args),
            Command::Serve(args) => commands::serve(args),
        }
    }
}
