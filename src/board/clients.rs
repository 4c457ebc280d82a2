use std::sync::Arc;

use super::gateway::Gateway;
use super::models::{Client, ClientFields};
use super::obligations::suggested_obligations;
use super::state::Session;
use crate::errors::{BoardError, BoardResult, require_text};

/// Client registry for one session.
pub struct ClientDirectory {
    gateway: Arc<dyn Gateway>,
    session: Session,
}

impl ClientDirectory {
    pub fn new(gateway: Arc<dyn Gateway>, session: Session) -> Self {
        Self { gateway, session }
    }

    /// All of the user's clients ordered by name.
    pub async fn list(&self) -> BoardResult<Vec<Client>> {
        let mut clients = self.gateway.get_clients(&self.session.user_id).await?;
        clients.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        Ok(clients)
    }

    /// Register a client. With no obligations given, the catalog
    /// suggestions for its tax regime are used.
    pub async fn add(&self, fields: ClientFields) -> BoardResult<Client> {
        let mut fields = normalize(fields)?;
        if let Some(regime) = fields
            .tax_regime
            .filter(|_| fields.active_obligations.is_empty())
        {
            fields.active_obligations = suggested_obligations(regime);
        }
        let client = self
            .gateway
            .add_client(&self.session.user_id, fields)
            .await?;
        tracing::info!(client_id = client.id, name = %client.name, "Client added");
        Ok(client)
    }

    /// Replace every editable field of the client. Tasks keep their
    /// snapshot of the old name and CNPJ.
    pub async fn update(&self, client_id: i64, fields: ClientFields) -> BoardResult<()> {
        let fields = normalize(fields)?;
        self.gateway.update_client(client_id, fields).await?;
        tracing::info!(client_id, "Client updated");
        Ok(())
    }

    pub async fn remove(&self, client_id: i64) -> BoardResult<()> {
        self.gateway.delete_client(client_id).await?;
        tracing::info!(client_id, "Client removed");
        Ok(())
    }

    /// Add many clients in order. Every row is validated before the first
    /// write; a store failure stops the import with earlier rows kept.
    pub async fn import(&self, rows: Vec<ClientFields>) -> BoardResult<usize> {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                normalize(row).map_err(|e| match e {
                    BoardError::Validation(msg) => {
                        BoardError::Validation(format!("Row {}: {}", index + 1, msg))
                    }
                    other => other,
                })
            })
            .collect::<BoardResult<Vec<_>>>()?;

        let total = rows.len();
        for (index, row) in rows.into_iter().enumerate() {
            self.gateway
                .add_client(&self.session.user_id, row)
                .await
                .inspect_err(|e| {
                    tracing::warn!(written = index, total, error = %e, "Client import aborted")
                })?;
        }
        tracing::info!(count = total, "Clients imported");
        Ok(total)
    }
}

/// Clients whose name contains `term` (case-insensitive) or whose CNPJ
/// contains it, with or without punctuation. A blank term matches all.
pub fn search<'a>(clients: &'a [Client], term: &str) -> Vec<&'a Client> {
    let term = term.trim();
    if term.is_empty() {
        return clients.iter().collect();
    }
    let lowered = term.to_lowercase();
    let digits = digits_of(term);
    clients
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&lowered)
                || c.cnpj.as_deref().is_some_and(|cnpj| {
                    cnpj.contains(term) || (!digits.is_empty() && digits_of(cnpj).contains(&digits))
                })
        })
        .collect()
}

fn digits_of(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim text fields, blank optionals to `None`, and drop empty or repeated
/// obligation entries.
fn normalize(fields: ClientFields) -> BoardResult<ClientFields> {
    let name = require_text("Client name", &fields.name)?;
    let mut obligations: Vec<String> = Vec::new();
    for obligation in fields.active_obligations {
        let obligation = obligation.trim();
        if !obligation.is_empty() && !obligations.iter().any(|o| o == obligation) {
            obligations.push(obligation.to_string());
        }
    }
    Ok(ClientFields {
        name,
        cnpj: optional(fields.cnpj),
        tax_regime: fields.tax_regime,
        active_obligations: obligations,
        email: optional(fields.email),
        phone: optional(fields.phone),
    })
}
