//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, PartId, TransactionId, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderStatus, PaymentMethod, TransitionError};

/// Order aggregate root.
///
/// Identity, owner, parts and total price are fixed at creation. Payment
/// data and status change only through the transition methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub(crate) id: OrderId,
    pub(crate) user_id: UserId,
    pub(crate) part_ids: Vec<PartId>,
    pub(crate) total_price: Money,
    pub(crate) transaction_id: Option<TransactionId>,
    pub(crate) payment_method: PaymentMethod,
    pub(crate) status: OrderStatus,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates a new order awaiting payment.
    ///
    /// `total_price` must already be the sum of the resolved part prices.
    pub fn new(user_id: UserId, part_ids: Vec<PartId>, total_price: Money) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            part_ids,
            total_price,
            transaction_id: None,
            payment_method: PaymentMethod::Unknown,
            status: OrderStatus::PendingPayment,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn part_ids(&self) -> &[PartId] {
        &self.part_ids
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Returns the payment transaction, set once the order is paid.
    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

// Transitions
impl Order {
    /// Records a successful payment.
    pub fn pay(
        &mut self,
        transaction_id: TransactionId,
        payment_method: PaymentMethod,
    ) -> Result<(), TransitionError> {
        if !self.status.can_pay() {
            return Err(TransitionError::CannotPay {
                status: self.status,
            });
        }

        self.transaction_id = Some(transaction_id);
        self.payment_method = payment_method;
        self.status = OrderStatus::Paid;
        self.touch();
        Ok(())
    }

    /// Records payment data on an order whose assembly was applied before
    /// its payment was persisted. The status stays `ASSEMBLED`.
    pub fn attach_late_payment(
        &mut self,
        transaction_id: TransactionId,
        payment_method: PaymentMethod,
    ) -> Result<(), TransitionError> {
        if self.status != OrderStatus::Assembled || self.transaction_id.is_some() {
            return Err(TransitionError::CannotPay {
                status: self.status,
            });
        }

        self.transaction_id = Some(transaction_id);
        self.payment_method = payment_method;
        self.touch();
        Ok(())
    }

    /// Cancels an order that has not been paid.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        match self.status {
            OrderStatus::Cancelled => return Err(TransitionError::AlreadyCancelled),
            OrderStatus::Paid | OrderStatus::Assembled => {
                return Err(TransitionError::AlreadyPaid);
            }
            OrderStatus::PendingPayment => {}
        }

        self.status = OrderStatus::Cancelled;
        self.touch();
        Ok(())
    }

    /// Marks the order assembled regardless of its current status and
    /// returns the previous status.
    pub fn mark_assembled(&mut self) -> OrderStatus {
        let previous = self.status;
        self.status = OrderStatus::Assembled;
        self.touch();
        previous
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
