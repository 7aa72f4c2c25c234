//! Customer and points commands.

use std::io::Write;

use honor_loyalty_client::CustomerSearch;
use honor_loyalty_core::{CustomerId, CustomerUpdate, NewCustomer, PointsAdjustment};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CliError, Context, stdout, write_customer};

pub async fn list(ctx: &Context, search: Option<&str>) -> Result<(), CliError> {
    let customers = ctx.client.list_customers(search).await?;
    let mut out = stdout();
    for customer in &customers {
        write_customer(&mut out, customer)?;
    }
    writeln!(out, "{} customer(s)", customers.len())?;
    Ok(())
}

pub async fn show(ctx: &Context, id: CustomerId) -> Result<(), CliError> {
    let customer = ctx.client.get_customer(id).await?;
    let mut out = stdout();
    writeln!(out, "Name:    {}", customer.full_name)?;
    writeln!(out, "Phone:   {}", customer.phone_number)?;
    writeln!(out, "Email:   {}", customer.email.as_deref().unwrap_or("-"))?;
    writeln!(out, "Points:  {}", customer.total_points)?;
    writeln!(out, "Joined:  {}", customer.created_at.format("%Y-%m-%d"))?;
    Ok(())
}

pub async fn create(
    ctx: &Context,
    name: &str,
    phone: &str,
    email: Option<&str>,
) -> Result<(), CliError> {
    let draft = NewCustomer::new(name, phone, email.map(str::to_owned))?;
    let customer = ctx.client.create_customer(&draft).await?;
    write_customer(&mut stdout(), &customer)?;
    Ok(())
}

pub async fn update(
    ctx: &Context,
    id: CustomerId,
    full_name: Option<String>,
    phone_number: Option<String>,
    email: Option<String>,
) -> Result<(), CliError> {
    let update = CustomerUpdate {
        full_name,
        phone_number,
        email,
    };
    let customer = ctx.client.update_customer(id, &update).await?;
    write_customer(&mut stdout(), &customer)?;
    Ok(())
}

pub async fn delete(ctx: &Context, id: CustomerId) -> Result<(), CliError> {
    ctx.client.delete_customer(id).await?;
    writeln!(stdout(), "Deleted {id}")?;
    Ok(())
}

pub async fn history(ctx: &Context, id: CustomerId) -> Result<(), CliError> {
    let transactions = ctx.client.list_transactions(id).await?;
    let mut out = stdout();
    for tx in &transactions {
        writeln!(
            out,
            "{}  {:<13} {:>+7}  {}",
            tx.created_at.format("%Y-%m-%d %H:%M"),
            tx.kind,
            tx.amount,
            tx.description
        )?;
    }
    if transactions.is_empty() {
        writeln!(out, "No transactions")?;
    }
    Ok(())
}

pub async fn add_points(
    ctx: &Context,
    id: CustomerId,
    amount: u32,
    description: &str,
) -> Result<(), CliError> {
    let adjustment = PointsAdjustment::new(amount, description)?;
    let customer = ctx.client.add_points(id, &adjustment).await?;
    writeln!(
        stdout(),
        "{} now has {} points",
        customer.full_name, customer.total_points
    )?;
    Ok(())
}

pub async fn deduct_points(
    ctx: &Context,
    id: CustomerId,
    amount: u32,
    description: &str,
) -> Result<(), CliError> {
    let adjustment = PointsAdjustment::new(amount, description)?;
    let customer = ctx.client.deduct_points(id, &adjustment).await?;
    writeln!(
        stdout(),
        "{} now has {} points",
        customer.full_name, customer.total_points
    )?;
    Ok(())
}

/// Read queries from stdin and print results as they settle.
pub async fn search(ctx: &Context) -> Result<(), CliError> {
    let search = CustomerSearch::spawn(ctx.client.clone(), ctx.config.search_debounce);
    let mut results = search.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(query) => search.set_query(query.trim()),
                None => break,
            },
            changed = results.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = results.borrow_and_update().clone();
                let mut out = stdout();
                if let Some(error) = &current.error {
                    writeln!(out, "! {error}")?;
                    continue;
                }
                writeln!(out, "-- \"{}\": {} match(es)", current.query, current.customers.len())?;
                for customer in &current.customers {
                    write_customer(&mut out, customer)?;
                }
            }
        }
    }
    Ok(())
}
