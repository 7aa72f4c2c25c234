//! Redemption and dashboard commands.

use std::io::Write;

use honor_loyalty_client::RedemptionDesk;
use honor_loyalty_core::{CustomerId, GiftId};

use super::{CliError, Context, stdout};

/// Select the pair on a fresh desk, show the outcome, and confirm if allowed.
pub async fn redeem(ctx: &Context, customer: CustomerId, gift: GiftId) -> Result<(), CliError> {
    let mut desk = RedemptionDesk::new(ctx.client.clone());
    desk.load().await?;
    desk.select_customer_by_id(customer)?;
    desk.select_gift_by_id(gift)?;

    let eligibility = desk.eligibility();
    if let Some(balance_after) = eligibility.balance_after {
        writeln!(stdout(), "Balance after redemption: {balance_after}")?;
    }

    let receipt = desk.confirm().await?;
    writeln!(
        stdout(),
        "Redeemed {} for {} ({} points). Balance now {}.",
        receipt.gift_name,
        receipt.customer_name,
        receipt.redemption.points_used,
        receipt.balance
    )?;
    Ok(())
}

pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let redemptions = ctx.client.list_redemptions().await?;
    let mut out = stdout();
    for r in &redemptions {
        writeln!(
            out,
            "{}  {}  customer {}  gift {}  {} pts",
            r.created_at.format("%Y-%m-%d %H:%M"),
            r.id,
            r.customer_id,
            r.gift_id,
            r.points_used
        )?;
    }
    writeln!(out, "{} redemption(s)", redemptions.len())?;
    Ok(())
}

pub async fn stats(ctx: &Context) -> Result<(), CliError> {
    let stats = ctx.client.dashboard_stats().await?;
    let mut out = stdout();
    writeln!(out, "Customers:       {}", stats.total_customers)?;
    writeln!(out, "Points issued:   {}", stats.total_points_issued)?;
    writeln!(out, "Redemptions:     {}", stats.total_redemptions)?;
    writeln!(out, "Active gifts:    {}", stats.active_gifts)?;
    Ok(())
}
