//! Checking every signature of a transaction against its digest.
//!
//! Slots nobody has signed yet (key type 0) are skipped; an incomplete
//! transaction is not an invalid one. Any other slot must verify with the
//! public key it carries. Scanning stops at the first failure.

use tracing::warn;

use super::builder::Transaction;
use super::error::{TransactionError, TxResult};

impl Transaction {
    /// Index of the first signed slot that fails verification, if any.
    pub fn first_invalid_signature(&self) -> TxResult<Option<usize>> {
        let digest = self.compute_digest()?.full;
        Ok(self
            .signatures()
            .iter()
            .position(|sig| sig.is_initialized() && !sig.verify(&digest)))
    }

    /// Verifies every signed slot.
    ///
    /// # Errors
    ///
    /// [`TransactionError::InvalidSignature`] carrying the first failing slot
    /// index, or whatever error packing the transaction for its digest hit.
    pub fn verify_all(&self) -> TxResult<()> {
        match self.first_invalid_signature()? {
            None => Ok(()),
            Some(index) => {
                warn!(
                    index,
                    txid = %hex::encode(self.transaction_id().unwrap_or_default()),
                    "signature verification failed"
                );
                Err(TransactionError::InvalidSignature { index })
            }
        }
    }
}
