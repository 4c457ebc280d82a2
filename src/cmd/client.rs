//! Client registry commands — `ledgerboard client ...`.

use anyhow::Result;
use console::style;
use ledgerboard::board::clients;
use ledgerboard::board::models::{Client, ClientFields};
use ledgerboard::config::AppConfig;
use ledgerboard::errors::BoardError;

use super::super::ClientCommands;
use super::{Workspace, read_json_rows, split_list};

pub async fn cmd_client(config: AppConfig, command: ClientCommands) -> Result<()> {
    let workspace = Workspace::open(config)?;
    let directory = workspace.clients();

    match command {
        ClientCommands::List { search, json } => {
            let all = directory.list().await?;
            let shown = clients::search(&all, search.as_deref().unwrap_or(""));
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
                return Ok(());
            }
            if shown.is_empty() {
                println!("No clients found.");
                return Ok(());
            }
            for client in shown {
                print_client(client);
            }
        }
        ClientCommands::Add {
            name,
            cnpj,
            regime,
            obligations,
            email,
            phone,
        } => {
            let client = directory
                .add(ClientFields {
                    name,
                    cnpj,
                    tax_regime: regime,
                    active_obligations: obligations.as_deref().map(split_list).unwrap_or_default(),
                    email,
                    phone,
                })
                .await?;
            println!(
                "{} Added client #{} {}",
                style("✓").green(),
                client.id,
                style(&client.name).bold()
            );
        }
        ClientCommands::Update {
            id,
            name,
            cnpj,
            regime,
            obligations,
            email,
            phone,
        } => {
            let all = directory.list().await?;
            let current = all
                .into_iter()
                .find(|c| c.id == id)
                .ok_or(BoardError::client_not_found(id))?;
            let fields = ClientFields {
                name: name.unwrap_or(current.name),
                cnpj: cnpj.or(current.cnpj),
                tax_regime: regime.or(current.tax_regime),
                active_obligations: obligations
                    .as_deref()
                    .map(split_list)
                    .unwrap_or(current.active_obligations),
                email: email.or(current.email),
                phone: phone.or(current.phone),
            };
            directory.update(id, fields).await?;
            println!("{} Updated client #{}", style("✓").green(), id);
        }
        ClientCommands::Remove { id } => {
            directory.remove(id).await?;
            println!("{} Removed client #{}", style("✓").green(), id);
        }
        ClientCommands::Import { file } => {
            let rows: Vec<ClientFields> = read_json_rows(&file)?;
            let count = directory.import(rows).await?;
            println!("{} Imported {} client(s)", style("✓").green(), count);
        }
    }

    Ok(())
}

fn print_client(client: &Client) {
    let mut details = Vec::new();
    if let Some(cnpj) = &client.cnpj {
        details.push(cnpj.clone());
    }
    if let Some(regime) = client.tax_regime {
        details.push(regime.to_string());
    }
    println!(
        "{} {} {}",
        style(format!("#{}", client.id)).dim(),
        style(&client.name).bold(),
        style(details.join(" · ")).dim()
    );
    if !client.active_obligations.is_empty() {
        println!("    obligations: {}", client.active_obligations.join(", "));
    }
    for contact in [&client.email, &client.phone].into_iter().flatten() {
        println!("    {}", contact);
    }
}
