mod payment_dto;

pub use payment_dto::{
    CheckoutResponseDto, CreatePaymentRequestDto, PaymentVerificationDto, VerifyPaymentRequestDto,
    WebhookAckDto,
};
