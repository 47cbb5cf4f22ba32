// 存储层
// 订单、支付记录、支付方式的读写接口，以及基于条件写入的支付终态更新

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{NewPayment, NewPaymentMethod, Order, Payment, PaymentMethod, PaymentResolution};

pub use postgres::PgCheckoutStore;

#[cfg(test)]
pub use memory::MemoryCheckoutStore;

/// 结账相关实体的存储接口
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// 连通性检查
    async fn ping(&self) -> Result<(), StoreError>;

    async fn load_order(&self, order_id: i64) -> Result<Option<Order>, StoreError>;

    async fn save_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn load_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, StoreError>;

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, StoreError>;

    /// 将支付从 new/pending 流转到终态
    ///
    /// 必须是条件写入：只有当前仍为 new/pending 时才更新。
    /// 返回 false 表示已被其他回调抢先处理。
    async fn resolve_payment(
        &self,
        payment_id: Uuid,
        resolution: PaymentResolution,
    ) -> Result<bool, StoreError>;

    async fn load_payment_method(&self, method_id: i64) -> Result<Option<PaymentMethod>, StoreError>;

    async fn insert_payment_method(
        &self,
        method: NewPaymentMethod,
    ) -> Result<PaymentMethod, StoreError>;

    async fn save_payment_method(&self, method: &PaymentMethod) -> Result<(), StoreError>;

    /// 删除支付方式，返回是否存在
    async fn delete_payment_method(&self, method_id: i64) -> Result<bool, StoreError>;
}
