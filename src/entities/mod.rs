//! Storefront tables read by the reporting layer.
//!
//! Every business table carries `organization_id`; all reads filter on it.

pub mod category;
pub mod customer;
pub mod order;
pub mod order_item;
pub mod organization;
pub mod product;
pub mod user;
