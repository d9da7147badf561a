//! Finalizing and saving the assistant message of an exchange

use neosantara_parts::{Reconciliation, Turn, reconcile};

use crate::error::{Error, Result};
use crate::records::{MessageRow, NewMessage};
use crate::store::ChatStore;

/// Reconcile the turns of a finished exchange and store the result.
///
/// Exactly one insert is attempted. A failed insert is returned as
/// [`Error::SaveFailed`] carrying the storage cause; nothing is retried.
pub async fn save_final_assistant_message(
    store: &dyn ChatStore,
    chat_id: &str,
    turns: &[Turn],
    message_group_id: Option<String>,
    model: Option<String>,
) -> Result<MessageRow> {
    save_reconciled(store, chat_id, reconcile(turns), message_group_id, model).await
}

/// Store an already reconciled assistant message
pub async fn save_reconciled(
    store: &dyn ChatStore,
    chat_id: &str,
    reconciliation: Reconciliation,
    message_group_id: Option<String>,
    model: Option<String>,
) -> Result<MessageRow> {
    if !reconciliation.anomalies.is_empty() {
        tracing::warn!(
            chat_id,
            anomalies = reconciliation.anomalies.len(),
            "assistant message reconciled with degraded parts"
        );
    }

    let row = NewMessage::from_finalized(
        chat_id,
        reconciliation.into_message(message_group_id, model),
    );

    match store.insert_message(&row).await {
        Ok(saved) => {
            tracing::info!(chat_id, message_id = saved.id, parts = row.parts.len(), "assistant message saved");
            Ok(saved)
        }
        Err(e) => {
            tracing::error!(chat_id, error = %e, "error saving final assistant message");
            Err(Error::save_failed(e))
        }
    }
}
