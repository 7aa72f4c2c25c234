//! Gift catalog commands.

use std::io::Write;

use honor_loyalty_core::{GiftId, GiftUpdate, NewGift};

use super::{CliError, Context, stdout, write_gift};

pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let gifts = ctx.client.list_gifts().await?;
    let mut out = stdout();
    for gift in &gifts {
        write_gift(&mut out, gift)?;
    }
    writeln!(out, "{} gift(s)", gifts.len())?;
    Ok(())
}

pub async fn create(
    ctx: &Context,
    name: &str,
    description: Option<&str>,
    points_required: u32,
    stock: u32,
) -> Result<(), CliError> {
    let draft = NewGift::new(name, description.map(str::to_owned), points_required, stock)?;
    let gift = ctx.client.create_gift(&draft).await?;
    write_gift(&mut stdout(), &gift)?;
    Ok(())
}

pub async fn update(
    ctx: &Context,
    id: GiftId,
    name: Option<String>,
    description: Option<String>,
    points_required: Option<u32>,
    stock: Option<u32>,
) -> Result<(), CliError> {
    let update = GiftUpdate {
        name,
        description,
        points_required,
        stock,
    };
    let gift = ctx.client.update_gift(id, &update).await?;
    write_gift(&mut stdout(), &gift)?;
    Ok(())
}

pub async fn delete(ctx: &Context, id: GiftId) -> Result<(), CliError> {
    ctx.client.delete_gift(id).await?;
    writeln!(stdout(), "Deleted {id}")?;
    Ok(())
}
