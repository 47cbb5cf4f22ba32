// 内存存储实现 (测试用)

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{NewPayment, NewPaymentMethod, Order, Payment, PaymentMethod, PaymentResolution};
use crate::storage::CheckoutStore;

#[derive(Default)]
struct Tables {
    orders: HashMap<i64, Order>,
    payments: HashMap<Uuid, Payment>,
    payment_methods: HashMap<i64, PaymentMethod>,
    next_method_id: i64,
}

#[derive(Default)]
pub struct MemoryCheckoutStore {
    tables: RwLock<Tables>,
}

impl MemoryCheckoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_order(&self, order: Order) {
        self.tables.write().await.orders.insert(order.id, order);
    }

    pub async fn put_payment(&self, payment: Payment) {
        self.tables.write().await.payments.insert(payment.id, payment);
    }

    pub async fn payments_for_order(&self, order_id: i64) -> Vec<Payment> {
        self.tables
            .read()
            .await
            .payments
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CheckoutStore for MemoryCheckoutStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load_order(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        Ok(self.tables.read().await.orders.get(&order_id).cloned())
    }

    async fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.orders.get_mut(&order.id) {
            Some(stored) => {
                *stored = order.clone();
                stored.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::Missing(format!("order {}", order.id))),
        }
    }

    async fn load_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, StoreError> {
        Ok(self.tables.read().await.payments.get(&payment_id).cloned())
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, StoreError> {
        let payment = payment.into_payment();
        self.tables
            .write()
            .await
            .payments
            .insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn resolve_payment(
        &self,
        payment_id: Uuid,
        resolution: PaymentResolution,
    ) -> Result<bool, StoreError> {
        // 写锁覆盖读取和更新，等价于条件写入
        let mut tables = self.tables.write().await;
        match tables.payments.get_mut(&payment_id) {
            Some(payment) => Ok(payment.resolve(resolution, Utc::now())),
            None => Err(StoreError::Missing(format!("payment {}", payment_id))),
        }
    }

    async fn load_payment_method(&self, method_id: i64) -> Result<Option<PaymentMethod>, StoreError> {
        Ok(self.tables.read().await.payment_methods.get(&method_id).cloned())
    }

    async fn insert_payment_method(
        &self,
        method: NewPaymentMethod,
    ) -> Result<PaymentMethod, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_method_id += 1;
        let method = PaymentMethod {
            id: tables.next_method_id,
            payment_gateway: method.payment_gateway,
            payment_option: method.payment_option.as_str().to_string(),
            response_code: None,
            seal: None,
            reusable: false,
            created_at: method.created_at,
        };
        tables.payment_methods.insert(method.id, method.clone());
        Ok(method)
    }

    async fn save_payment_method(&self, method: &PaymentMethod) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.payment_methods.get_mut(&method.id) {
            Some(stored) => {
                *stored = method.clone();
                Ok(())
            }
            None => Err(StoreError::Missing(format!("payment method {}", method.id))),
        }
    }

    async fn delete_payment_method(&self, method_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .write()
            .await
            .payment_methods
            .remove(&method_id)
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OperatingMode, OrderState, PaymentBrand, PaymentState, RemoteState};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn order() -> Order {
        Order {
            id: 9,
            total: Decimal::new(500, 2),
            currency: "EUR".to_string(),
            language: "en".to_string(),
            checkout_step: "order_information".to_string(),
            state: OrderState::Draft,
            payment_gateway: None,
            payment_method_id: None,
            placed_at: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_concurrent_resolution_only_one_wins() {
        let store = Arc::new(MemoryCheckoutStore::new());
        let payment = store
            .insert_payment(NewPayment::for_order(&order(), 1, "sips_payment", OperatingMode::Test, Utc::now()))
            .await
            .unwrap();
        let payment_id = payment.id;

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let resolution = if i % 2 == 0 {
                PaymentResolution::Completed
            } else {
                PaymentResolution::Voided
            };
            handles.push(tokio::spawn(async move {
                store.resolve_payment(payment_id, resolution).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let stored = store.load_payment(payment_id).await.unwrap().unwrap();
        assert_ne!(stored.state, PaymentState::New);
        assert_ne!(stored.remote_state, RemoteState::Pending);
    }

    #[tokio::test]
    async fn test_payment_method_lifecycle() {
        let store = MemoryCheckoutStore::new();
        let method = store
            .insert_payment_method(NewPaymentMethod {
                payment_gateway: "sips_payment".to_string(),
                payment_option: PaymentBrand::Maestro,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(method.id, 1);
        assert_eq!(method.payment_option, "MAESTRO");
        assert!(!method.reusable);

        assert!(store.delete_payment_method(method.id).await.unwrap());
        assert!(!store.delete_payment_method(method.id).await.unwrap());
        assert!(store.load_payment_method(method.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_missing_order_fails() {
        let store = MemoryCheckoutStore::new();
        assert!(store.save_order(&order()).await.is_err());
        store.put_order(order()).await;
        assert!(store.save_order(&order()).await.is_ok());
    }
}
