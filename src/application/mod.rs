pub mod cart_store;
pub mod checkout;
pub mod order_service;

#[cfg(test)]
pub(crate) mod test_helpers;
