//! Order placement.
//!
//! The store persists the order, its lines and the stock decrements in one
//! transaction. Only once that has committed does this service look at the
//! payment method and, for bank transfers, email the customer the transfer
//! details. A mail failure is logged and never undoes or fails the order.

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::db::{CatalogRepository, OrderRepository, PlaceOrderError, Store};
use crate::error::add_breadcrumb;
use crate::models::{BankInfo, NewOrder, OrderDetail, Profile};
use crate::services::email::{OrderMailer, PaymentInstructions};
use crate::state::AppState;

/// Response body of a successful checkout.
///
/// Bank transfers get the order wrapped together with the transfer
/// recipient. Every other payment method gets the bare order.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PlacedOrder {
    BankTransfer { order: OrderDetail, info: BankInfo },
    Other(OrderDetail),
}

impl PlacedOrder {
    #[must_use]
    pub const fn order(&self) -> &OrderDetail {
        match self {
            Self::BankTransfer { order, .. } | Self::Other(order) => order,
        }
    }

    /// Transfer recipient, present only for bank transfer payments.
    #[must_use]
    pub const fn info(&self) -> Option<&BankInfo> {
        match self {
            Self::BankTransfer { info, .. } => Some(info),
            Self::Other(_) => None,
        }
    }
}

/// Order placement service.
pub struct OrderingService<'a> {
    store: &'a dyn Store,
    mailer: &'a dyn OrderMailer,
    bank_transfer_slug: &'a str,
    store_name: &'a str,
}

impl<'a> OrderingService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        mailer: &'a dyn OrderMailer,
        bank_transfer_slug: &'a str,
        store_name: &'a str,
    ) -> Self {
        Self {
            store,
            mailer,
            bank_transfer_slug,
            store_name,
        }
    }

    #[must_use]
    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            state.store(),
            state.mailer(),
            &state.config().bank_transfer_slug,
            &state.config().store_name,
        )
    }

    /// Place an order for `customer`.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError::EmptyOrder` for an empty item list, the
    /// `Unknown*` variants for slugs that do not resolve, and
    /// `PlaceOrderError::Repository` when the transaction fails. Nothing is
    /// persisted and no email is sent in any of these cases.
    #[instrument(skip_all, fields(profile_id = %customer.id, payment = %order.payment))]
    pub async fn place(
        &self,
        customer: &Profile,
        order: &NewOrder,
    ) -> Result<PlacedOrder, PlaceOrderError> {
        if order.items.is_empty() {
            return Err(PlaceOrderError::EmptyOrder);
        }

        let placed = self.store.place_order(customer.id, order).await?;
        add_breadcrumb(
            "checkout",
            "Order placed",
            &[
                ("order_id", placed.id.to_string()),
                ("payment", placed.payment_slug.clone()),
            ],
        );

        if placed.payment_slug != self.bank_transfer_slug {
            return Ok(PlacedOrder::Other(placed));
        }

        let info = match self.store.bank_info().await {
            Ok(info) => info,
            Err(e) => {
                error!(order_id = %placed.id, error = %e, "Failed to load bank info");
                None
            }
        };
        let Some(info) = info else {
            warn!(order_id = %placed.id, "No bank info configured, skipping payment email");
            return Ok(PlacedOrder::Other(placed));
        };
        self.send_instructions(&placed, &info).await;

        Ok(PlacedOrder::BankTransfer {
            order: placed,
            info,
        })
    }

    async fn send_instructions(&self, order: &OrderDetail, bank: &BankInfo) {
        let Some(to) = &order.user.user.email else {
            warn!(order_id = %order.id, "Customer has no email address, skipping payment email");
            return;
        };

        let instructions = PaymentInstructions::new(order, bank, self.store_name);
        match self.mailer.send_payment_instructions(to, &instructions).await {
            Ok(()) => info!(order_id = %order.id, "Payment instructions sent"),
            Err(e) => error!(
                order_id = %order.id,
                error = %e,
                "Failed to send payment instructions"
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use record_store_core::{Email, OrderState, ZipCode};

    use super::*;
    use crate::db::{MemoryStore, ProfileRepository};
    use crate::models::{NewAccount, NewOrderLine, NewProduct};
    use crate::services::email::EmailError;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(Email, PaymentInstructions)>>,
        fail: bool,
    }

    #[async_trait]
    impl OrderMailer for Recorder {
        async fn send_payment_instructions(
            &self,
            to: &Email,
            instructions: &PaymentInstructions,
        ) -> Result<(), EmailError> {
            if self.fail {
                return Err(EmailError::InvalidAddress(to.to_string()));
            }
            self.sent.lock().unwrap().push((to.clone(), instructions.clone()));
            Ok(())
        }
    }

    async fn seeded() -> (MemoryStore, Profile) {
        let store = MemoryStore::new();
        let genre = store.upsert_genre("Rock", "rock").await.unwrap();
        let medium = store.upsert_medium("CD").await.unwrap();
        store
            .upsert_product(&NewProduct {
                genre,
                artist: None,
                title: "Nevermind".to_owned(),
                slug: "nevermind".to_owned(),
                medium,
                medium_count: 1,
                release_date: NaiveDate::from_ymd_opt(1991, 9, 24).unwrap(),
                image: None,
                description: None,
                price: Decimal::new(5900, 2),
                length: Some(49),
                label: None,
                tags: vec![],
                stock: 1,
            })
            .await
            .unwrap();
        store.upsert_shipping("Post", "post", Decimal::new(1200, 2)).await.unwrap();
        store.upsert_payment("Bank transfer", "bank-transfer").await.unwrap();
        store.upsert_payment("Cash on delivery", "cash-on-delivery").await.unwrap();
        store
            .set_bank_info(&BankInfo {
                account: "11 2222 3333 4444".to_owned(),
                name: "Music Shop".to_owned(),
                address: "ul. Płytowa 1, 00-001 Warszawa".to_owned(),
            })
            .await
            .unwrap();

        let account = store
            .create_account(&NewAccount {
                username: "kurt".to_owned(),
                email: Some(Email::parse("kurt@example.com").unwrap()),
                first_name: String::new(),
                last_name: String::new(),
            })
            .await
            .unwrap();
        let profile = store.get_or_create_profile(account).await.unwrap();
        (store, profile)
    }

    fn order(payment: &str, quantity: i32) -> NewOrder {
        NewOrder {
            shipping: "post".to_owned(),
            payment: payment.to_owned(),
            address: "Aberdeen St 1".to_owned(),
            zip_code: ZipCode::parse("98-520").unwrap(),
            city: "Aberdeen".to_owned(),
            phone: None,
            items: vec![NewOrderLine {
                product: "nevermind".to_owned(),
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn test_bank_transfer_sends_one_email_with_total() {
        let (store, profile) = seeded().await;
        let mailer = Recorder::default();
        let service = OrderingService::new(&store, &mailer, "bank-transfer", "Music Shop");

        let placed = service.place(&profile, &order("bank-transfer", 1)).await.unwrap();

        assert!(placed.info().is_some());
        let body = serde_json::to_value(&placed).unwrap();
        assert_eq!(body["order"]["code"], placed.order().code.to_string());
        assert_eq!(body["info"]["name"], "Music Shop");
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.as_str(), "kurt@example.com");
        assert_eq!(sent[0].1.amount, Decimal::new(7100, 2));
        assert_eq!(sent[0].1.reference, placed.order().code);
    }

    #[tokio::test]
    async fn test_other_payment_sends_nothing() {
        let (store, profile) = seeded().await;
        let mailer = Recorder::default();
        let service = OrderingService::new(&store, &mailer, "bank-transfer", "Music Shop");

        let placed = service.place(&profile, &order("cash-on-delivery", 1)).await.unwrap();

        assert!(placed.info().is_none());
        let body = serde_json::to_value(&placed).unwrap();
        assert!(body.get("order").is_none());
        assert!(body.get("info").is_none());
        assert_eq!(body["id"], placed.order().id.as_i32());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_order_sends_nothing() {
        let (store, profile) = seeded().await;
        let mailer = Recorder::default();
        let service = OrderingService::new(&store, &mailer, "bank-transfer", "Music Shop");

        let err = service.place(&profile, &order("bank-transfer", 2)).await.unwrap_err();

        assert!(matches!(err, PlaceOrderError::Repository(_)));
        assert!(mailer.sent.lock().unwrap().is_empty());
        assert!(store.list_orders(profile.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mail_failure_keeps_order() {
        let (store, profile) = seeded().await;
        let mailer = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let service = OrderingService::new(&store, &mailer, "bank-transfer", "Music Shop");

        let placed = service.place(&profile, &order("bank-transfer", 1)).await.unwrap();

        let stored = store.get_order(profile.id, placed.order().id).await.unwrap().unwrap();
        assert_eq!(stored.state, OrderState::Ordered);
    }
}
