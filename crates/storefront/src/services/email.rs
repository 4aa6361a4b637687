//! Email delivery for order notifications.
//!
//! Uses SMTP via lettre for delivery with Askama text and HTML templates.
//! Without SMTP settings the [`LogMailer`] writes the message to the log
//! instead, which is what development setups use.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;
use uuid::Uuid;

use record_store_core::{Email, OrderId};

use crate::config::EmailConfig;
use crate::models::{BankInfo, OrderDetail};

/// HTML template for the bank transfer instructions email.
#[derive(Template)]
#[template(path = "email/payment_instructions.html")]
struct PaymentInstructionsHtml<'a> {
    greeting: &'a str,
    store_name: &'a str,
    amount: &'a str,
    account: &'a str,
    recipient_name: &'a str,
    recipient_address: &'a str,
    reference: &'a str,
}

/// Plain text template for the bank transfer instructions email.
#[derive(Template)]
#[template(path = "email/payment_instructions.txt")]
struct PaymentInstructionsText<'a> {
    greeting: &'a str,
    store_name: &'a str,
    amount: &'a str,
    account: &'a str,
    recipient_name: &'a str,
    recipient_address: &'a str,
    reference: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Everything a customer needs to pay an order by bank transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInstructions {
    pub order_id: OrderId,
    /// Username the customer is greeted with.
    pub greeting: String,
    pub store_name: String,
    /// Order total including shipping.
    pub amount: Decimal,
    pub account: String,
    pub recipient_name: String,
    pub recipient_address: String,
    /// Transfer title: the order's public code.
    pub reference: Uuid,
}

impl PaymentInstructions {
    #[must_use]
    pub fn new(order: &OrderDetail, bank: &BankInfo, store_name: &str) -> Self {
        Self {
            order_id: order.id,
            greeting: order.user.user.username.clone(),
            store_name: store_name.to_owned(),
            amount: order.total_price,
            account: bank.account.clone(),
            recipient_name: bank.name.clone(),
            recipient_address: bank.address.clone(),
            reference: order.code,
        }
    }

    #[must_use]
    pub fn subject(&self) -> String {
        format!("{} - Thank you for your order", self.store_name)
    }

    /// Render the plain text and HTML bodies.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Template` if either template fails to render.
    pub fn render(&self) -> Result<(String, String), EmailError> {
        let amount = self.amount.to_string();
        let reference = self.reference.to_string();

        let text = PaymentInstructionsText {
            greeting: &self.greeting,
            store_name: &self.store_name,
            amount: &amount,
            account: &self.account,
            recipient_name: &self.recipient_name,
            recipient_address: &self.recipient_address,
            reference: &reference,
        }
        .render()?;
        let html = PaymentInstructionsHtml {
            greeting: &self.greeting,
            store_name: &self.store_name,
            amount: &amount,
            account: &self.account,
            recipient_name: &self.recipient_name,
            recipient_address: &self.recipient_address,
            reference: &reference,
        }
        .render()?;

        Ok((text, html))
    }
}

/// Sends order-related emails to customers.
#[async_trait]
pub trait OrderMailer: Send + Sync {
    /// Send bank transfer instructions for a freshly placed order.
    async fn send_payment_instructions(
        &self,
        to: &Email,
        instructions: &PaymentInstructions,
    ) -> Result<(), EmailError>;
}

/// SMTP-backed mailer.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a new SMTP mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_owned(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_owned()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl OrderMailer for SmtpMailer {
    async fn send_payment_instructions(
        &self,
        to: &Email,
        instructions: &PaymentInstructions,
    ) -> Result<(), EmailError> {
        let (text, html) = instructions.render()?;
        self.send_multipart_email(to.as_str(), &instructions.subject(), text, html)
            .await
    }
}

/// Development mailer that logs messages instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl OrderMailer for LogMailer {
    async fn send_payment_instructions(
        &self,
        to: &Email,
        instructions: &PaymentInstructions,
    ) -> Result<(), EmailError> {
        let (text, _) = instructions.render()?;
        tracing::info!(
            to = %to,
            order_id = %instructions.order_id,
            subject = %instructions.subject(),
            body = %text,
            "SMTP not configured, logging payment instructions"
        );
        Ok(())
    }
}
