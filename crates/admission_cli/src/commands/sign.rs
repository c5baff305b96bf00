use anyhow::{Context, Result};
use clap::Args;

use admission_core::signature::payment_signature;

use crate::config::Config;

/// Produces the checkout signature for an order/payment pair, for exercising
/// `/payment/verify` without the hosted checkout.
#[derive(Debug, Args)]
pub struct SignArgs {
    #[arg(long)]
    pub order: String,

    #[arg(long)]
    pub payment: String,

    /// Defaults to RAZORPAY_SECRET
    #[arg(long)]
    pub secret: Option<String>,
}

pub fn run(config: &Config, args: SignArgs) -> Result<()> {
    let secret = args
        .secret
        .or_else(|| config.razorpay_secret.clone())
        .context("pass --secret or set RAZORPAY_SECRET")?;
    let signature = payment_signature(&secret, &args.order, &args.payment).context("Invalid secret")?;
    println!("{signature}");
    Ok(())
}
