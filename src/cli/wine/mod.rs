//! Wine subcommands - runs one service operation and prints JSON

use std::io::Write;

use anyhow::Context;
use serde::Serialize;
use tracing::debug;

use super::{Command, WineArgs};
use crate::domain::pagination::{Direction, PageRequest, Sort};
use crate::domain::wine::{Wine, WineRepository};
use crate::infrastructure::wine::WineService;

/// Execute a subcommand against the service, writing results to `out`
///
/// Lists are written one wine per line. A missing wine on `get` or `update`
/// is reported on `out` and is not an error.
pub async fn execute<R, W>(
    service: &WineService<R>,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: WineRepository + ?Sized,
    W: Write,
{
    match command {
        Command::List => {
            let wines = service.get_all().await?;
            write_lines(out, &wines)
        }
        Command::Get { id } => match service.get_by_id(id).await? {
            Some(wine) => write_json(out, &wine),
            None => write_not_found(out, id),
        },
        Command::Find { appellation } => {
            let wines = service.find_by_appellation(&appellation).await?;
            write_lines(out, &wines)
        }
        Command::Page {
            page,
            size,
            sort,
            desc,
        } => {
            let mut request = PageRequest::of(page, size);

            if let Some(field) = sort {
                let direction = if desc { Direction::Desc } else { Direction::Asc };
                request = request.with_sort(Sort {
                    field: field.into(),
                    direction,
                });
            }

            let page = service.pageable(&request).await?;
            debug!(
                total = page.total_elements,
                pages = page.total_pages(),
                "Fetched page"
            );
            write_json(out, &page)
        }
        Command::Add { wine, id } => {
            let mut wine = to_wine(wine);

            if let Some(id) = id {
                wine = wine.with_id(id);
            }

            let saved = service.add(wine).await?;
            write_json(out, &saved)
        }
        Command::Update { id, wine } => {
            match service.update(to_wine(wine).with_id(id)).await? {
                Some(wine) => write_json(out, &wine),
                None => write_not_found(out, id),
            }
        }
        Command::Delete { id } => {
            service
                .delete_by_id(id)
                .await
                .with_context(|| format!("Failed to delete wine {}", id))?;
            writeln!(out, "{}", serde_json::json!({ "deleted": true, "id": id }))?;
            Ok(())
        }
    }
}

fn to_wine(args: WineArgs) -> Wine {
    Wine::new(args.chateau, args.appellation, args.price)
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_lines<W: Write>(out: &mut W, wines: &[Wine]) -> anyhow::Result<()> {
    for wine in wines {
        write_json(out, wine)?;
    }

    Ok(())
}

fn write_not_found<W: Write>(out: &mut W, id: i32) -> anyhow::Result<()> {
    writeln!(out, "{}", serde_json::json!({ "found": false, "id": id }))?;
    Ok(())
}
