//! In-process store with the same semantics as [`super::PgStore`].
//!
//! All state sits behind one `tokio::sync::RwLock`. Writers hold the write
//! lock for the whole operation, which gives the all-or-nothing behaviour
//! the Postgres backend gets from transactions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use record_store_core::{
    AccountId, ArtistId, GenreId, LabelId, MediumId, OrderId, OrderState, PaymentId,
    ProductId, ProfileId, Rating, ReviewId, ShippingId, ZipCode, order_total,
};

use super::RepositoryError;
use super::repository::{
    CatalogRepository, DeleteOutcome, OrderRepository, PlaceOrderError, ProductFilter,
    ProductOrdering, ProfileRepository, ReviewError, ReviewRepository, Store,
};
use crate::models::{
    AccountInfo, BankInfo, NamedRef, NewAccount, NewOrder, NewProduct, NewReview, OrderDetail,
    OrderLine, OrderSummary, PaymentMethod, ProductDetail, ProductSummary, Profile, ProfileUpdate,
    Review, ShippingMethod, profile::non_empty,
};

#[derive(Debug, Clone)]
struct Lookup {
    name: String,
    slug: String,
}

#[derive(Debug, Clone)]
struct ProductRecord {
    data: NewProduct,
    created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ProfileRecord {
    account: AccountId,
    address: Option<String>,
    zip_code: Option<ZipCode>,
    city: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Clone)]
struct ReviewRecord {
    author: ProfileId,
    product: ProductId,
    parent: Option<ReviewId>,
    text: String,
    rate: Rating,
    active: bool,
    created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct OrderRecord {
    code: Uuid,
    profile: ProfileId,
    shipping: ShippingId,
    payment: PaymentId,
    address: String,
    zip_code: ZipCode,
    city: String,
    phone: Option<String>,
    state: OrderState,
    created: DateTime<Utc>,
    items: Vec<(ProductId, i32)>,
}

#[derive(Debug, Default)]
struct State {
    next_id: i32,
    accounts: BTreeMap<AccountId, AccountInfo>,
    profiles: BTreeMap<ProfileId, ProfileRecord>,
    genres: BTreeMap<GenreId, Lookup>,
    artists: BTreeMap<ArtistId, Lookup>,
    labels: BTreeMap<LabelId, Lookup>,
    media: BTreeMap<MediumId, String>,
    products: BTreeMap<ProductId, ProductRecord>,
    reviews: BTreeMap<ReviewId, ReviewRecord>,
    shipping: BTreeMap<ShippingId, ShippingMethod>,
    payments: BTreeMap<PaymentId, PaymentMethod>,
    orders: BTreeMap<OrderId, OrderRecord>,
    bank_info: Option<BankInfo>,
}

fn find_slug<K: Copy>(map: &BTreeMap<K, Lookup>, slug: &str) -> Option<K> {
    map.iter().find(|(_, l)| l.slug == slug).map(|(id, _)| *id)
}

fn dangling(what: &str, id: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("{what} {id} does not exist"))
}

impl State {
    /// Serial ids shared across tables; uniqueness per table is all that
    /// matters.
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn product_id(&self, slug: &str) -> Option<ProductId> {
        self.products
            .iter()
            .find(|(_, p)| p.data.slug == slug)
            .map(|(id, _)| *id)
    }

    fn named<K: Ord>(map: &BTreeMap<K, Lookup>, id: &K) -> Option<NamedRef> {
        map.get(id).map(|l| NamedRef::new(&l.name, &l.slug))
    }

    fn product(&self, id: ProductId) -> Result<ProductDetail, RepositoryError> {
        let record = self.products.get(&id).ok_or_else(|| dangling("product", id))?;
        let p = &record.data;
        let genre = Self::named(&self.genres, &p.genre).ok_or_else(|| dangling("genre", p.genre))?;
        let medium_type = self
            .media
            .get(&p.medium)
            .cloned()
            .ok_or_else(|| dangling("medium", p.medium))?;
        let mut tags = p.tags.clone();
        tags.sort();
        tags.dedup();

        Ok(ProductDetail {
            genre,
            artist: p.artist.and_then(|a| Self::named(&self.artists, &a)),
            title: p.title.clone(),
            slug: p.slug.clone(),
            medium_type,
            medium_count: p.medium_count,
            release_date: p.release_date,
            image: p.image.clone(),
            description: p.description.clone(),
            price: p.price,
            length: p.length,
            label: p.label.and_then(|l| Self::named(&self.labels, &l)),
            tags,
            stock: p.stock,
        })
    }

    fn profile(&self, id: ProfileId) -> Result<Profile, RepositoryError> {
        let record = self.profiles.get(&id).ok_or_else(|| dangling("profile", id))?;
        let user = self
            .accounts
            .get(&record.account)
            .cloned()
            .ok_or_else(|| dangling("account", record.account))?;

        Ok(Profile {
            id,
            account_id: record.account,
            user,
            address: record.address.clone(),
            zip_code: record.zip_code.clone(),
            city: record.city.clone(),
            phone: record.phone.clone(),
        })
    }

    fn profile_of(&self, account: AccountId) -> Option<ProfileId> {
        self.profiles
            .iter()
            .find(|(_, p)| p.account == account)
            .map(|(id, _)| *id)
    }

    fn ensure_profile(&mut self, account: AccountId) -> Result<ProfileId, RepositoryError> {
        if !self.accounts.contains_key(&account) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(id) = self.profile_of(account) {
            return Ok(id);
        }
        let id = ProfileId::new(self.next_id());
        self.profiles.insert(
            id,
            ProfileRecord {
                account,
                address: None,
                zip_code: None,
                city: None,
                phone: None,
            },
        );
        Ok(id)
    }

    fn review(&self, id: ReviewId) -> Result<Review, RepositoryError> {
        let record = self.reviews.get(&id).ok_or_else(|| dangling("review", id))?;
        let product = self
            .products
            .get(&record.product)
            .ok_or_else(|| dangling("product", record.product))?;

        Ok(Review {
            id,
            author: self.profile(record.author)?,
            product: product.data.slug.clone(),
            parent: record.parent,
            text: record.text.clone(),
            rate: record.rate,
            created: record.created,
        })
    }

    fn order(&self, id: OrderId) -> Result<OrderDetail, RepositoryError> {
        let record = self.orders.get(&id).ok_or_else(|| dangling("order", id))?;
        let shipping = self
            .shipping
            .get(&record.shipping)
            .ok_or_else(|| dangling("shipping", record.shipping))?;
        let payment = self
            .payments
            .get(&record.payment)
            .ok_or_else(|| dangling("payment", record.payment))?;

        let items = record
            .items
            .iter()
            .map(|(product, quantity)| {
                Ok(OrderLine {
                    product: self.product(*product)?,
                    quantity: *quantity,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        let total_price = order_total(
            shipping.price,
            items.iter().map(|line| (line.product.price, line.quantity)),
        );

        Ok(OrderDetail {
            id,
            code: record.code,
            user: self.profile(record.profile)?,
            shipping: NamedRef::new(&shipping.name, &shipping.slug),
            payment: payment.name.clone(),
            payment_slug: payment.slug.clone(),
            total_price,
            address: record.address.clone(),
            zip_code: record.zip_code.clone(),
            city: record.city.clone(),
            phone: record.phone.clone(),
            state: record.state,
            created: record.created,
            items,
        })
    }

    fn upsert_lookup<K: Copy + Ord + From<i32>>(
        &mut self,
        pick: fn(&mut Self) -> &mut BTreeMap<K, Lookup>,
        name: &str,
        slug: &str,
    ) -> K {
        let lookup = Lookup {
            name: name.to_owned(),
            slug: slug.to_owned(),
        };
        if let Some(id) = find_slug(pick(self), slug) {
            pick(self).insert(id, lookup);
            return id;
        }
        let id = K::from(self.next_id());
        pick(self).insert(id, lookup);
        id
    }
}

/// In-memory store. Cheap to construct; every instance starts empty.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide or restore a review, standing in for moderation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown review.
    pub async fn set_review_active(
        &self,
        id: ReviewId,
        active: bool,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let review = state.reviews.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        review.active = active;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let state = self.state.read().await;

        let mut matched = Vec::new();
        for (id, record) in &state.products {
            let detail = state.product(*id)?;
            if filter.matches(&detail) {
                matched.push((record.created, *id, detail));
            }
        }

        match filter.ordering {
            ProductOrdering::PriceAsc => matched.sort_by(|a, b| {
                a.2.price.cmp(&b.2.price).then_with(|| b.0.cmp(&a.0)).then_with(|| b.1.cmp(&a.1))
            }),
            ProductOrdering::PriceDesc => matched.sort_by(|a, b| {
                b.2.price.cmp(&a.2.price).then_with(|| b.0.cmp(&a.0)).then_with(|| b.1.cmp(&a.1))
            }),
            ProductOrdering::CreatedAsc => matched.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1))),
            ProductOrdering::CreatedDesc => matched.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1))),
        }

        Ok(matched
            .into_iter()
            .map(|(_, _, detail)| ProductSummary::from(detail))
            .collect())
    }

    async fn get_product(&self, slug: &str) -> Result<Option<ProductDetail>, RepositoryError> {
        let state = self.state.read().await;
        state.product_id(slug).map(|id| state.product(id)).transpose()
    }

    async fn list_shipping(&self) -> Result<Vec<ShippingMethod>, RepositoryError> {
        let state = self.state.read().await;
        let mut methods: Vec<_> = state.shipping.values().cloned().collect();
        methods.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)));
        Ok(methods)
    }

    async fn list_payments(&self) -> Result<Vec<PaymentMethod>, RepositoryError> {
        Ok(self.state.read().await.payments.values().cloned().collect())
    }

    async fn bank_info(&self) -> Result<Option<BankInfo>, RepositoryError> {
        Ok(self.state.read().await.bank_info.clone())
    }

    async fn upsert_genre(&self, name: &str, slug: &str) -> Result<GenreId, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.upsert_lookup(|s| &mut s.genres, name, slug))
    }

    async fn upsert_artist(&self, name: &str, slug: &str) -> Result<ArtistId, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.upsert_lookup(|s| &mut s.artists, name, slug))
    }

    async fn upsert_label(
        &self,
        name: &str,
        slug: &str,
        _description: Option<&str>,
    ) -> Result<LabelId, RepositoryError> {
        // Descriptions are not part of any read model.
        let mut state = self.state.write().await;
        Ok(state.upsert_lookup(|s| &mut s.labels, name, slug))
    }

    async fn upsert_medium(&self, name: &str) -> Result<MediumId, RepositoryError> {
        let mut state = self.state.write().await;
        if let Some((id, _)) = state.media.iter().find(|(_, n)| *n == name) {
            return Ok(*id);
        }
        let id = MediumId::new(state.next_id());
        state.media.insert(id, name.to_owned());
        Ok(id)
    }

    async fn upsert_product(&self, product: &NewProduct) -> Result<ProductId, RepositoryError> {
        let mut state = self.state.write().await;

        if !state.genres.contains_key(&product.genre)
            || !state.media.contains_key(&product.medium)
            || product.artist.is_some_and(|a| !state.artists.contains_key(&a))
            || product.label.is_some_and(|l| !state.labels.contains_key(&l))
        {
            return Err(RepositoryError::Conflict(
                "product references a missing genre, medium, artist or label".to_owned(),
            ));
        }
        if product.stock < 0 {
            return Err(RepositoryError::Conflict(
                "stock must not be negative".to_owned(),
            ));
        }

        if let Some(id) = state.product_id(&product.slug) {
            if let Some(record) = state.products.get_mut(&id) {
                record.data = product.clone();
            }
            return Ok(id);
        }

        let id = ProductId::new(state.next_id());
        state.products.insert(
            id,
            ProductRecord {
                data: product.clone(),
                created: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn upsert_shipping(
        &self,
        name: &str,
        slug: &str,
        price: Decimal,
    ) -> Result<ShippingId, RepositoryError> {
        let mut state = self.state.write().await;
        let id = match state.shipping.values().find(|s| s.slug == slug) {
            Some(existing) => existing.id,
            None => ShippingId::new(state.next_id()),
        };
        state.shipping.insert(
            id,
            ShippingMethod {
                id,
                name: name.to_owned(),
                slug: slug.to_owned(),
                price,
            },
        );
        Ok(id)
    }

    async fn upsert_payment(&self, name: &str, slug: &str) -> Result<PaymentId, RepositoryError> {
        let mut state = self.state.write().await;
        let id = match state.payments.values().find(|p| p.slug == slug) {
            Some(existing) => existing.id,
            None => PaymentId::new(state.next_id()),
        };
        state.payments.insert(
            id,
            PaymentMethod {
                id,
                name: name.to_owned(),
                slug: slug.to_owned(),
            },
        );
        Ok(id)
    }

    async fn set_bank_info(&self, info: &BankInfo) -> Result<(), RepositoryError> {
        self.state.write().await.bank_info = Some(info.clone());
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn list_reviews(&self, product_slug: &str) -> Result<Vec<Review>, RepositoryError> {
        let state = self.state.read().await;
        let Some(product) = state.product_id(product_slug) else {
            return Ok(Vec::new());
        };

        let mut ids: Vec<_> = state
            .reviews
            .iter()
            .filter(|(_, r)| r.product == product && r.active)
            .map(|(id, r)| (r.created, *id))
            .collect();
        ids.sort();

        ids.into_iter().map(|(_, id)| state.review(id)).collect()
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review, ReviewError> {
        let mut state = self.state.write().await;

        let product = state
            .product_id(&review.product_slug)
            .ok_or(ReviewError::ProductNotFound)?;
        if let Some(parent) = review.parent
            && state.reviews.get(&parent).is_none_or(|p| p.product != product)
        {
            return Err(ReviewError::InvalidParent(parent));
        }
        if !state.profiles.contains_key(&review.author) {
            return Err(RepositoryError::Conflict("review author does not exist".to_owned()).into());
        }

        let id = ReviewId::new(state.next_id());
        state.reviews.insert(
            id,
            ReviewRecord {
                author: review.author,
                product,
                parent: review.parent,
                text: review.text.clone(),
                rate: review.rate,
                active: true,
                created: Utc::now(),
            },
        );
        Ok(state.review(id)?)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn list_orders(&self, profile: ProfileId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let state = self.state.read().await;
        let mut orders = state
            .orders
            .iter()
            .filter(|(_, o)| o.profile == profile)
            .map(|(id, _)| state.order(*id).map(|d| d.summary()))
            .collect::<Result<Vec<_>, _>>()?;
        orders.sort_by(|a, b| (b.created, b.id).cmp(&(a.created, a.id)));
        Ok(orders)
    }

    async fn get_order(
        &self,
        profile: ProfileId,
        id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let state = self.state.read().await;
        match state.orders.get(&id) {
            Some(order) if order.profile == profile => state.order(id).map(Some),
            _ => Ok(None),
        }
    }

    async fn delete_order(
        &self,
        profile: ProfileId,
        id: OrderId,
    ) -> Result<DeleteOutcome, RepositoryError> {
        let mut state = self.state.write().await;
        let outcome = match state.orders.get(&id) {
            Some(order) if order.profile == profile => {
                if order.state.is_deletable() {
                    DeleteOutcome::Deleted
                } else {
                    DeleteOutcome::Locked(order.state)
                }
            }
            _ => DeleteOutcome::NotFound,
        };
        if outcome == DeleteOutcome::Deleted {
            state.orders.remove(&id);
        }
        Ok(outcome)
    }

    async fn place_order(
        &self,
        profile: ProfileId,
        order: &NewOrder,
    ) -> Result<OrderDetail, PlaceOrderError> {
        if order.items.is_empty() {
            return Err(PlaceOrderError::EmptyOrder);
        }

        let mut state = self.state.write().await;

        let shipping = state
            .shipping
            .values()
            .find(|s| s.slug == order.shipping)
            .map(|s| s.id)
            .ok_or_else(|| PlaceOrderError::UnknownShipping(order.shipping.clone()))?;
        let payment = state
            .payments
            .values()
            .find(|p| p.slug == order.payment)
            .map(|p| p.id)
            .ok_or_else(|| PlaceOrderError::UnknownPayment(order.payment.clone()))?;

        let mut items = Vec::with_capacity(order.items.len());
        for (line, item) in order.items.iter().enumerate() {
            let product =
                state
                    .product_id(&item.product)
                    .ok_or_else(|| PlaceOrderError::UnknownProduct {
                        line,
                        slug: item.product.clone(),
                    })?;
            items.push((product, item.quantity));
        }

        // Check every constraint before touching anything.
        if !state.profiles.contains_key(&profile) {
            return Err(RepositoryError::Conflict("order owner does not exist".to_owned()).into());
        }
        let mut remaining: BTreeMap<ProductId, i32> = BTreeMap::new();
        for (product, quantity) in &items {
            if *quantity < 1 {
                return Err(RepositoryError::Conflict(
                    "order item quantity must be positive".to_owned(),
                )
                .into());
            }
            let stock = remaining.entry(*product).or_insert_with(|| {
                state.products.get(product).map_or(0, |p| p.data.stock)
            });
            *stock -= quantity;
            if *stock < 0 {
                return Err(RepositoryError::Conflict(format!(
                    "insufficient stock for product {product}"
                ))
                .into());
            }
        }

        for (product, stock) in remaining {
            if let Some(record) = state.products.get_mut(&product) {
                record.data.stock = stock;
            }
        }
        let id = OrderId::new(state.next_id());
        state.orders.insert(
            id,
            OrderRecord {
                code: Uuid::new_v4(),
                profile,
                shipping,
                payment,
                address: order.address.trim().to_owned(),
                zip_code: order.zip_code.clone(),
                city: order.city.trim().to_owned(),
                phone: order.phone.clone(),
                state: OrderState::Ordered,
                created: Utc::now(),
                items,
            },
        );

        Ok(state.order(id)?)
    }

    async fn set_order_state(&self, id: OrderId, state: OrderState) -> Result<(), RepositoryError> {
        let mut guard = self.state.write().await;
        let order = guard.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        order.state = state;
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn create_account(&self, account: &NewAccount) -> Result<AccountId, RepositoryError> {
        let mut state = self.state.write().await;
        if state.accounts.values().any(|a| a.username == account.username) {
            return Err(RepositoryError::Conflict(format!(
                "username '{}' is already taken",
                account.username
            )));
        }
        let id = AccountId::new(state.next_id());
        state.accounts.insert(
            id,
            AccountInfo {
                username: account.username.clone(),
                first_name: account.first_name.clone(),
                last_name: account.last_name.clone(),
                email: account.email.clone(),
            },
        );
        Ok(id)
    }

    async fn get_or_create_profile(&self, account: AccountId) -> Result<Profile, RepositoryError> {
        let mut state = self.state.write().await;
        let id = state.ensure_profile(account)?;
        state.profile(id)
    }

    async fn update_profile(
        &self,
        account: AccountId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let mut state = self.state.write().await;
        let id = state.ensure_profile(account)?;

        if let Some(user) = state.accounts.get_mut(&account) {
            if let Some(first) = &update.first_name {
                first.trim().clone_into(&mut user.first_name);
            }
            if let Some(last) = &update.last_name {
                last.trim().clone_into(&mut user.last_name);
            }
        }
        if let Some(profile) = state.profiles.get_mut(&id) {
            if let Some(address) = &update.address {
                profile.address = non_empty(address);
            }
            if let Some(zip_code) = &update.zip_code {
                profile.zip_code.clone_from(zip_code);
            }
            if let Some(city) = &update.city {
                profile.city = non_empty(city);
            }
            if let Some(phone) = &update.phone {
                profile.phone = non_empty(phone);
            }
        }

        state.profile(id)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::NaiveDate;

    use record_store_core::Email;

    use super::*;
    use crate::models::NewOrderLine;

    struct Fixture {
        store: MemoryStore,
        profile: ProfileId,
        other: ProfileId,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let genre = store.upsert_genre("Jazz", "jazz").await.unwrap();
        let cd = store.upsert_medium("CD").await.unwrap();
        let vinyl = store.upsert_medium("Vinyl").await.unwrap();

        for (slug, medium, price, stock) in [
            ("kind-of-blue", vinyl, Decimal::new(12900, 2), 5),
            ("a-love-supreme", cd, Decimal::new(4999, 2), 2),
        ] {
            store
                .upsert_product(&NewProduct {
                    genre,
                    artist: None,
                    title: slug.to_owned(),
                    slug: slug.to_owned(),
                    medium,
                    medium_count: 1,
                    release_date: NaiveDate::from_ymd_opt(1960, 1, 1).unwrap(),
                    image: None,
                    description: None,
                    price,
                    length: None,
                    label: None,
                    tags: vec![],
                    stock,
                })
                .await
                .unwrap();
        }
        store.upsert_shipping("Courier", "courier", Decimal::new(1500, 2)).await.unwrap();
        store.upsert_payment("Bank transfer", "bank-transfer").await.unwrap();

        let mut profiles = Vec::new();
        for username in ["anna", "piotr"] {
            let account = store
                .create_account(&NewAccount {
                    username: username.to_owned(),
                    email: Some(Email::parse(&format!("{username}@example.com")).unwrap()),
                    first_name: String::new(),
                    last_name: String::new(),
                })
                .await
                .unwrap();
            profiles.push(store.get_or_create_profile(account).await.unwrap().id);
        }

        Fixture {
            store,
            profile: profiles[0],
            other: profiles[1],
        }
    }

    fn order(items: &[(&str, i32)]) -> NewOrder {
        NewOrder {
            shipping: "courier".to_owned(),
            payment: "bank-transfer".to_owned(),
            address: "ul. Długa 1".to_owned(),
            zip_code: ZipCode::parse("00-950").unwrap(),
            city: "Warszawa".to_owned(),
            phone: None,
            items: items
                .iter()
                .map(|(product, quantity)| NewOrderLine {
                    product: (*product).to_owned(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    async fn stock(store: &MemoryStore, slug: &str) -> i32 {
        store.get_product(slug).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_place_order_decrements_stock_and_totals() {
        let f = fixture().await;
        let placed = f
            .store
            .place_order(f.profile, &order(&[("kind-of-blue", 2), ("a-love-supreme", 1)]))
            .await
            .unwrap();

        // 2 * 129.00 + 49.99 + 15.00
        assert_eq!(placed.total_price, Decimal::new(32299, 2));
        assert_eq!(placed.state, OrderState::Ordered);
        assert_eq!(placed.items.len(), 2);
        assert_eq!(stock(&f.store, "kind-of-blue").await, 3);
        assert_eq!(stock(&f.store, "a-love-supreme").await, 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let f = fixture().await;
        let err = f
            .store
            .place_order(f.profile, &order(&[("kind-of-blue", 1), ("a-love-supreme", 3)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PlaceOrderError::Repository(RepositoryError::Conflict(_))
        ));
        assert_eq!(stock(&f.store, "kind-of-blue").await, 5);
        assert!(f.store.list_orders(f.profile).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_lines_share_stock() {
        let f = fixture().await;
        let err = f
            .store
            .place_order(f.profile, &order(&[("a-love-supreme", 2), ("a-love-supreme", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaceOrderError::Repository(_)));
        assert_eq!(stock(&f.store, "a-love-supreme").await, 2);
    }

    #[tokio::test]
    async fn test_unknown_references() {
        let f = fixture().await;

        let mut bad = order(&[("kind-of-blue", 1)]);
        bad.shipping = "drone".to_owned();
        assert!(matches!(
            f.store.place_order(f.profile, &bad).await,
            Err(PlaceOrderError::UnknownShipping(s)) if s == "drone"
        ));

        let bad = order(&[("kind-of-blue", 1), ("missing", 1)]);
        assert!(matches!(
            f.store.place_order(f.profile, &bad).await,
            Err(PlaceOrderError::UnknownProduct { line: 1, .. })
        ));
        assert!(matches!(
            f.store.place_order(f.profile, &order(&[])).await,
            Err(PlaceOrderError::EmptyOrder)
        ));
    }

    #[tokio::test]
    async fn test_delete_respects_owner_and_state() {
        let f = fixture().await;
        let first = f.store.place_order(f.profile, &order(&[("kind-of-blue", 1)])).await.unwrap();
        let second = f.store.place_order(f.profile, &order(&[("kind-of-blue", 1)])).await.unwrap();

        assert_eq!(
            f.store.delete_order(f.other, first.id).await.unwrap(),
            DeleteOutcome::NotFound
        );

        f.store.set_order_state(second.id, OrderState::Shipped).await.unwrap();
        assert_eq!(
            f.store.delete_order(f.profile, second.id).await.unwrap(),
            DeleteOutcome::Locked(OrderState::Shipped)
        );

        assert_eq!(
            f.store.delete_order(f.profile, first.id).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(f.store.get_order(f.profile, first.id).await.unwrap().is_none());
        assert!(f.store.get_order(f.profile, second.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reviews_are_threaded_per_product() {
        let f = fixture().await;
        let root = f
            .store
            .create_review(&NewReview {
                author: f.profile,
                product_slug: "kind-of-blue".to_owned(),
                parent: None,
                text: "Essential.".to_owned(),
                rate: Rating::new(5).unwrap(),
            })
            .await
            .unwrap();

        let foreign = f
            .store
            .create_review(&NewReview {
                author: f.other,
                product_slug: "a-love-supreme".to_owned(),
                parent: Some(root.id),
                text: "Reply".to_owned(),
                rate: Rating::new(4).unwrap(),
            })
            .await;
        assert!(matches!(foreign, Err(ReviewError::InvalidParent(id)) if id == root.id));

        f.store.set_review_active(root.id, false).await.unwrap();
        assert!(f.store.list_reviews("kind-of-blue").await.unwrap().is_empty());
        assert!(f.store.list_reviews("no-such-record").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile_update_clears_with_empty_string() {
        let f = fixture().await;
        let account = f.store.get_or_create_profile(AccountId::new(0)).await;
        assert!(matches!(account, Err(RepositoryError::NotFound)));

        let profile = f.store.state.read().await.profile(f.profile).unwrap();
        let updated = f
            .store
            .update_profile(
                profile.account_id,
                &ProfileUpdate {
                    city: Some("Kraków".to_owned()),
                    first_name: Some(" Anna ".to_owned()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.city.as_deref(), Some("Kraków"));
        assert_eq!(updated.user.first_name, "Anna");

        let cleared = f
            .store
            .update_profile(
                profile.account_id,
                &ProfileUpdate {
                    city: Some(String::new()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.city, None);
        assert_eq!(cleared.user.first_name, "Anna");
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let f = fixture().await;
        let again = f
            .store
            .create_account(&NewAccount {
                username: "anna".to_owned(),
                email: None,
                first_name: String::new(),
                last_name: String::new(),
            })
            .await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));
    }
}
