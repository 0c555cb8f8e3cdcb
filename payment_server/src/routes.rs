//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use settlement_engine::{
    db_types::{Order, OrderId},
    helpers::PaymentVerification,
    transition,
    OrderEvent,
    SettlementApi,
    SettlementDatabase,
    SettlementError,
};

use crate::{
    config::ServerOptions,
    data_objects::{CreatePaymentRequest, CreatePaymentResponse, JsonResponse, VerifyPaymentRequest, VerifyPaymentResponse},
    errors::ServerError,
    helpers::get_remote_ip,
    integrations::razorpay::{PaymentGateway, WebhookAction},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(verify_payment => Post "/payment/verify" impl SettlementDatabase);
/// Route handler for the payment callback.
///
/// After checkout, the gateway hands the buyer's browser the gateway order id, the payment id and a signature over
/// both. The storefront posts them here along with its own order id. If the signature is authentic, the order is
/// settled: marked as paid and confirmed, and every artist on the order is credited.
///
/// Posting the same callback twice is safe. The second call reports `already_settled` and writes nothing.
pub async fn verify_payment<B: SettlementDatabase>(
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let verification = PaymentVerification::from(body.into_inner());
    trace!("💻️ Received payment verification for order {}", verification.order_id);
    let result = api.settle(&verification).await.map_err(|e| {
        log_settlement_error(&verification.order_id, &e);
        ServerError::from(e)
    })?;
    debug!("💻️ Payment verification for order {} complete. {result:?}", result.order_id);
    Ok(HttpResponse::Ok().json(VerifyPaymentResponse::from(result)))
}

route!(create_payment => Post "/payment/create" impl SettlementDatabase, PaymentGateway);
/// Route handler for starting checkout.
///
/// Opens a gateway order for the full order total and records its id against the order. The checkout widget is then
/// opened with the returned `razorpayOrderId` and amount (in minor units).
///
/// The amount and currency in the request must match the stored order. They are checked, never trusted.
pub async fn create_payment<B, G>(
    body: web::Json<CreatePaymentRequest>,
    api: web::Data<SettlementApi<B>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    let request = body.into_inner();
    let order_id = request.order_id.clone();
    debug!("💻️ Creating payment for order {order_id}: {} {}", request.amount, request.currency);
    let order = api.fetch_order(&order_id).await?.ok_or_else(|| {
        debug!("💻️ Cannot create payment for unknown order {order_id}");
        SettlementError::OrderNotFound(order_id.clone())
    })?;
    check_payable(&order, &request)?;
    let gateway_order = gateway.create_gateway_order(&order_id, order.total_price, &order.currency).await.map_err(|e| {
        error!("💻️ Could not create gateway order for {order_id}. {e}");
        ServerError::from(e)
    })?;
    api.begin_payment(&order_id, &gateway_order.id).await.map_err(|e| {
        log_settlement_error(&order_id, &e);
        ServerError::from(e)
    })?;
    info!("💻️ Payment for order {order_id} opened as gateway order {}", gateway_order.id);
    Ok(HttpResponse::Ok().json(CreatePaymentResponse {
        success: true,
        razorpay_order_id: gateway_order.id,
        amount: gateway_order.amount,
        currency: gateway_order.currency,
    }))
}

fn check_payable(order: &Order, request: &CreatePaymentRequest) -> Result<(), ServerError> {
    // The gateway order does not exist yet. Any id other than the stored one gives the same verdict.
    let event = OrderEvent::InitiatePayment { gateway_order_id: String::default() };
    transition(order, &event, order.updated_at).map_err(|e| {
        warn!("💻️ {e}");
        SettlementError::from(e)
    })?;
    if request.amount != order.total_price {
        warn!(
            "💻️ Payment request for order {} is for {}, but the order total is {}",
            order.order_id, request.amount, order.total_price
        );
        return Err(ServerError::InvalidRequestBody(format!(
            "The amount {} does not match the order total of {}",
            request.amount, order.total_price
        )));
    }
    if !request.currency.eq_ignore_ascii_case(&order.currency) {
        return Err(ServerError::InvalidRequestBody(format!(
            "The currency {} does not match the order currency {}",
            request.currency, order.currency
        )));
    }
    Ok(())
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(razorpay_webhook => Post "" impl SettlementDatabase);
/// Route handler for gateway webhooks. Deliveries reach this handler only after the HMAC middleware has
/// authenticated them.
///
/// Webhook responses must be in the 200 range unless the gateway should retry. Only retryable failures produce an
/// error response.
pub async fn razorpay_webhook<B: SettlementDatabase>(
    req: HttpRequest,
    body: web::Json<razorpay_tools::WebhookEvent>,
    api: web::Data<SettlementApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let event = body.into_inner();
    let peer = get_remote_ip(&req, *options.get_ref()).map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".into());
    trace!("💻️ Received webhook '{}' from {peer}", event.event);
    let result = match WebhookAction::from_event(&event) {
        WebhookAction::Ignore(what) => {
            debug!("💻️ Ignoring webhook: {what}");
            return Ok(HttpResponse::Ok().json(JsonResponse::success("Event ignored.")));
        },
        WebhookAction::Settle { order_id, gateway_order_id, payment_id } => {
            match resolve_order_id(&api, order_id, Some(&gateway_order_id)).await? {
                Some(order_id) => api
                    .settle_webhook(&order_id, &gateway_order_id, &payment_id)
                    .await
                    .map(|r| format!("Order {order_id} settled. {} earnings records created.", r.earnings_created))
                    .map_err(|e| (order_id, e)),
                None => return Ok(unknown_order(&gateway_order_id)),
            }
        },
        WebhookAction::PaymentAttemptFailed { order_id, gateway_order_id, payment_id } => {
            match resolve_order_id(&api, order_id, gateway_order_id.as_deref()).await? {
                Some(order_id) => {
                    let payment_id = payment_id.as_deref().unwrap_or("(unknown)");
                    Ok(format!("Payment attempt {payment_id} for order {order_id} failed. The order remains open."))
                },
                None => return Ok(unknown_order(gateway_order_id.as_deref().unwrap_or("(none)"))),
            }
        },
        WebhookAction::Refund { order_id, gateway_order_id } => {
            match resolve_order_id(&api, order_id, gateway_order_id.as_deref()).await? {
                Some(order_id) => api
                    .apply_event(&order_id, OrderEvent::Refund)
                    .await
                    .map(|_| format!("Refund recorded for order {order_id}."))
                    .map_err(|e| (order_id, e)),
                None => return Ok(unknown_order(gateway_order_id.as_deref().unwrap_or("(none)"))),
            }
        },
    };
    match result {
        Ok(message) => {
            info!("💻️ Webhook '{}': {message}", event.event);
            Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
        },
        Err((order_id, e)) if e.is_retryable() => {
            log_settlement_error(&order_id, &e);
            Err(e.into())
        },
        Err((order_id, e)) => {
            log_settlement_error(&order_id, &e);
            Ok(HttpResponse::Ok().json(JsonResponse::failure(e)))
        },
    }
}

async fn resolve_order_id<B: SettlementDatabase>(
    api: &SettlementApi<B>,
    order_id: Option<OrderId>,
    gateway_order_id: Option<&str>,
) -> Result<Option<OrderId>, ServerError> {
    if order_id.is_some() {
        return Ok(order_id);
    }
    let Some(gateway_order_id) = gateway_order_id else {
        return Ok(None);
    };
    let order = api.fetch_order_by_gateway_order_id(gateway_order_id).await?;
    Ok(order.map(|o| o.order_id))
}

fn unknown_order(gateway_order_id: &str) -> HttpResponse {
    warn!("💻️ Webhook for gateway order {gateway_order_id} does not match any order");
    HttpResponse::Ok().json(JsonResponse::failure(format!("No order for gateway order {gateway_order_id}")))
}

fn log_settlement_error(order_id: &OrderId, e: &SettlementError) {
    match e {
        SettlementError::InvalidSignature(_) | SettlementError::OrderNotFound(_) => {
            warn!("💻️ Rejected settlement request for order {order_id}. {e}")
        },
        SettlementError::IllegalTransition(_) | SettlementError::GatewayOrderMismatch { .. } => {
            warn!("💻️ Order {order_id} cannot be updated. {e}")
        },
        _ => error!("💻️ Settlement of order {order_id} failed. [{}] {e}", e.code()),
    }
}
