use std::sync::Arc;
use std::time::Duration;

use crate::models::Customer;
use crate::repository::CustomerRepository;
use crate::PaymentError;
use merx_core::payment::PaymentProvider;

/// Maps internal account ids to processor customer ids, creating the
/// processor-side customer lazily on first use.
pub struct CustomerRegistry {
    customers: Arc<dyn CustomerRepository>,
    provider: Arc<dyn PaymentProvider>,
    deadline: Duration,
}

impl CustomerRegistry {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        provider: Arc<dyn PaymentProvider>,
        deadline: Duration,
    ) -> Self {
        Self {
            customers,
            provider,
            deadline,
        }
    }

    /// Look the customer up locally; on miss, create it with the
    /// processor and persist the mapping.
    ///
    /// Two concurrent first-time calls for the same account can each
    /// mint a processor customer. That duplication is accepted: the
    /// processor is the billing source of truth and this table is only
    /// the id mapping, so no lock is taken here.
    pub async fn find_or_create(
        &self,
        account_id: i64,
        email: &str,
        name: &str,
    ) -> Result<Customer, PaymentError> {
        if let Some(existing) = self
            .customers
            .find_by_account(account_id)
            .await
            .map_err(|e| PaymentError::Storage(e.to_string()))?
        {
            return Ok(existing);
        }

        let customer_id =
            tokio::time::timeout(self.deadline, self.provider.create_customer(email, name))
                .await
                .map_err(|_| PaymentError::Upstream("customer creation timed out".to_string()))?
                .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let customer = Customer::new(account_id, customer_id);
        self.customers
            .save(&customer)
            .await
            .map_err(|e| PaymentError::Storage(e.to_string()))?;

        tracing::info!(account_id, customer_id = %customer.customer_id, "customer created");

        Ok(customer)
    }
}
