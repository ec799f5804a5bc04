//! Chain service models.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::transactions::settlement::Verdict;

/// How far the cluster has progressed with a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Processed,
    Confirmed,
    Finalized,
}

/// Known state of a signature.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignatureStatus {
    pub confirmation_status: Option<ConfirmationStatus>,

    /// Execution error reported by the chain, if the transfer failed.
    #[serde(default)]
    pub err: Option<Value>,

    #[serde(default)]
    pub slot: Option<u64>,
}

impl SignatureStatus {
    /// Only finalized, error-free signatures settle as confirmed.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.err.as_ref().is_some_and(|err| !err.is_null()) {
            return Verdict::Failed;
        }

        match self.confirmation_status {
            Some(ConfirmationStatus::Finalized) => Verdict::Confirmed,
            Some(ConfirmationStatus::Processed | ConfirmationStatus::Confirmed) | None => {
                Verdict::Processing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn status(body: Value) -> SignatureStatus {
        serde_json::from_value(body).expect("valid status body")
    }

    #[test]
    fn finalized_without_error_is_confirmed() {
        let finalized = status(json!({ "confirmation_status": "finalized", "err": null, "slot": 9 }));

        assert_eq!(finalized.verdict(), Verdict::Confirmed);
        assert_eq!(finalized.slot, Some(9));
    }

    #[test]
    fn seen_but_not_final_is_processing() {
        for level in ["processed", "confirmed"] {
            let body = status(json!({ "confirmation_status": level }));

            assert_eq!(body.verdict(), Verdict::Processing, "{level}");
        }
    }

    #[test]
    fn any_error_fails_the_transfer() {
        let failed = status(json!({
            "confirmation_status": "finalized",
            "err": { "InstructionError": [0, "Custom"] },
        }));

        assert_eq!(failed.verdict(), Verdict::Failed);
    }
}
