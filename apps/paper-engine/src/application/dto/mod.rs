//! Data Transfer Objects

mod place_order_dto;

pub use place_order_dto::{PlaceOrderRequest, PlaceOrderResult};
