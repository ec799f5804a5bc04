//! Order status machine.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use thiserror::Error;

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [Self; 8] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Completed,
        Self::Cancelled,
        Self::Refunded,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }

    /// Stock is still held for orders that have not left the warehouse.
    #[must_use]
    pub const fn holds_stock(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Processing)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value `{0}`")]
pub struct UnknownValue(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnknownValue(value.to_string()))
    }
}

/// Payment status, orthogonal to fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Paid, Self::Failed, Self::Refunded];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnknownValue(value.to_string()))
    }
}

/// Actions that move an existing order through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    Confirm,
    Process,
    Ship,
    Deliver,
    Complete,
    Cancel,
    Refund,
    Rate,
}

impl OrderAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Process => "process",
            Self::Ship => "ship",
            Self::Deliver => "deliver",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Refund => "refund",
            Self::Rate => "rate",
        }
    }

    /// Whether someone with the given relationship to the order may act.
    #[must_use]
    pub const fn permits(self, party: Party) -> bool {
        match self {
            Self::Confirm | Self::Process | Self::Ship | Self::Deliver | Self::Refund => {
                party.market_owner
            }
            Self::Complete | Self::Rate => party.buyer,
            Self::Cancel => party.buyer || party.market_owner,
        }
    }

    /// Apply the action to the observed state.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] carrying the unchanged status when the
    /// action is not legal from `state`.
    pub fn apply(self, state: OrderState) -> Result<Transition, TransitionError> {
        let status = state.status;

        let next = match (self, status) {
            (Self::Confirm, OrderStatus::Pending | OrderStatus::Confirmed) => {
                OrderStatus::Confirmed
            }
            (Self::Process, OrderStatus::Confirmed | OrderStatus::Processing) => {
                OrderStatus::Processing
            }
            (Self::Ship, current) if !current.is_terminal() => OrderStatus::Shipped,
            (Self::Deliver, current) if !current.is_terminal() => OrderStatus::Delivered,
            (Self::Complete, OrderStatus::Delivered) => OrderStatus::Completed,
            (Self::Cancel, OrderStatus::Pending | OrderStatus::Confirmed) => OrderStatus::Cancelled,
            (Self::Refund, current)
                if !current.is_terminal() && matches!(state.payment_status, PaymentStatus::Paid) =>
            {
                OrderStatus::Refunded
            }
            (Self::Rate, OrderStatus::Completed) if !state.rated => OrderStatus::Completed,
            _ => {
                return Err(TransitionError {
                    current: status,
                    action: self,
                });
            }
        };

        let payment_status = match self {
            Self::Refund => PaymentStatus::Refunded,
            _ => state.payment_status,
        };

        let releases_stock = match self {
            Self::Cancel => true,
            Self::Refund => status.holds_stock(),
            _ => false,
        };

        Ok(Transition {
            status: next,
            payment_status,
            releases_stock,
        })
    }
}

impl Display for OrderAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// How the acting user relates to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Party {
    pub buyer: bool,
    pub market_owner: bool,
}

impl Party {
    #[must_use]
    pub const fn is_participant(self) -> bool {
        self.buyer || self.market_owner
    }
}

/// The parts of an order the state machine looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderState {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub rated: bool,
}

/// Outcome of a legal action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub releases_stock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} an order that is {current}")]
pub struct TransitionError {
    pub current: OrderStatus,
    pub action: OrderAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: OrderStatus) -> OrderState {
        OrderState {
            status,
            payment_status: PaymentStatus::Pending,
            rated: false,
        }
    }

    fn next(action: OrderAction, status: OrderStatus) -> Option<OrderStatus> {
        action.apply(state(status)).ok().map(|transition| transition.status)
    }

    #[test]
    fn confirm_is_idempotent_from_pending_or_confirmed() {
        assert_eq!(next(OrderAction::Confirm, OrderStatus::Pending), Some(OrderStatus::Confirmed));
        assert_eq!(next(OrderAction::Confirm, OrderStatus::Confirmed), Some(OrderStatus::Confirmed));
        assert_eq!(next(OrderAction::Confirm, OrderStatus::Shipped), None);
    }

    #[test]
    fn ship_and_deliver_are_allowed_from_any_open_status() {
        for status in OrderStatus::ALL {
            let open = !status.is_terminal();

            assert_eq!(next(OrderAction::Ship, status).is_some(), open, "ship from {status}");
            assert_eq!(next(OrderAction::Deliver, status).is_some(), open, "deliver from {status}");
        }
    }

    #[test]
    fn cancel_only_before_processing_and_releases_stock() {
        let transition = OrderAction::Cancel
            .apply(state(OrderStatus::Confirmed))
            .expect("cancel from confirmed");

        assert_eq!(transition.status, OrderStatus::Cancelled);
        assert!(transition.releases_stock);

        for status in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Cancelled] {
            assert_eq!(
                OrderAction::Cancel.apply(state(status)),
                Err(TransitionError {
                    current: status,
                    action: OrderAction::Cancel
                })
            );
        }
    }

    #[test]
    fn complete_requires_delivery() {
        assert_eq!(
            next(OrderAction::Complete, OrderStatus::Delivered),
            Some(OrderStatus::Completed)
        );
        assert_eq!(next(OrderAction::Complete, OrderStatus::Shipped), None);
    }

    #[test]
    fn rate_requires_completed_and_unrated() {
        assert_eq!(next(OrderAction::Rate, OrderStatus::Completed), Some(OrderStatus::Completed));
        assert_eq!(next(OrderAction::Rate, OrderStatus::Delivered), None);

        let rated = OrderState {
            rated: true,
            ..state(OrderStatus::Completed)
        };

        assert!(OrderAction::Rate.apply(rated).is_err());
    }

    #[test]
    fn refund_requires_paid_and_releases_stock_only_before_shipping() {
        let paid = |status| OrderState {
            payment_status: PaymentStatus::Paid,
            ..state(status)
        };

        assert!(OrderAction::Refund.apply(state(OrderStatus::Confirmed)).is_err());

        let before_shipping = OrderAction::Refund
            .apply(paid(OrderStatus::Processing))
            .expect("refund from processing");

        assert_eq!(before_shipping.status, OrderStatus::Refunded);
        assert_eq!(before_shipping.payment_status, PaymentStatus::Refunded);
        assert!(before_shipping.releases_stock);

        let after_shipping = OrderAction::Refund
            .apply(paid(OrderStatus::Shipped))
            .expect("refund from shipped");

        assert!(!after_shipping.releases_stock);
        assert!(OrderAction::Refund.apply(paid(OrderStatus::Completed)).is_err());
    }

    #[test]
    fn actors_are_checked_per_action() {
        let buyer = Party {
            buyer: true,
            market_owner: false,
        };
        let owner = Party {
            buyer: false,
            market_owner: true,
        };

        assert!(OrderAction::Ship.permits(owner));
        assert!(!OrderAction::Ship.permits(buyer));
        assert!(OrderAction::Rate.permits(buyer));
        assert!(!OrderAction::Rate.permits(owner));
        assert!(OrderAction::Cancel.permits(buyer));
        assert!(OrderAction::Cancel.permits(owner));
        assert!(!OrderAction::Cancel.permits(Party::default()));
    }

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!("SHIPPED".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!("paid".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
