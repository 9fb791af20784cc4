pub mod catalog;
pub mod checkout;
pub mod payment;
pub mod payment_result;
pub mod pricing;
pub mod selection;
pub mod sessions;

#[cfg(test)]
pub(crate) mod test_support;
