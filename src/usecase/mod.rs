pub mod make_payment;

pub use make_payment::MakePayment;
