//! Print the symbolic form of a small model: its states, elementary rate
//! assignments and transition matrix.
//!
//! ```sh
//! cargo run --example model_listing
//! ```

use anyhow::Result;
use channelsol::prelude::*;

fn main() -> Result<()> {
    let model = ModelSpec::new(2, vec!["Na", "Ca"], vec![1, 2])
        .with_interaction(InteractionMode::SingleQ)
        .compile()?;

    println!("{}", model.state_listing());
    println!();
    println!("{}", model.rate_listing());
    println!();
    println!("{}", model.matrix_listing());
    Ok(())
}
