//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into the engine. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits on the database or the payment gateway,
//! so they must stay `async` all the way down.
//!
//! Both callables take the caller's claims as `Option<JwtClaims>` and the body as a `Result`. The caller is checked
//! first, so a request without a valid token is refused as unauthenticated whatever its body looks like.
use actix_web::{error::JsonPayloadError, get, web, HttpRequest, HttpResponse, Responder};
use canteen_engine::{
    payment_objects::{Caller, NewPaymentIntent, PaymentConfirmation},
    traits::{OrderCommitDatabase, PaymentGateway},
    OrderCommitApi,
    OrderCommitError,
};
use log::*;

use crate::{
    auth::JwtClaims,
    data_objects::{
        ConfirmPaymentRequest,
        ConfirmPaymentResponse,
        CreatePaymentIntentRequest,
        CreatePaymentIntentResponse,
    },
    errors::ServerError,
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

/// Malformed request bodies are reported in the same error shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, req: &HttpRequest| {
        debug!("💻️ Rejected request body for {}. {err}", req.path());
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

/// Resolves the caller, then the body. Body errors are only reported to authenticated callers.
fn authenticated_body<T>(
    claims: Option<JwtClaims>,
    body: Result<web::Json<T>, actix_web::Error>,
) -> Result<(Caller, T), actix_web::Error> {
    let caller = claims.map(|c| c.caller()).ok_or_else(|| ServerError::from(OrderCommitError::Unauthenticated))?;
    Ok((caller, body?.into_inner()))
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment_intent => Post "/create_payment_intent" impl OrderCommitDatabase, PaymentGateway);
/// Route handler for the createPaymentIntent callable
///
/// Opens a payment with the gateway for `amount` paise and returns the gateway's id for it as `orderId`. The client
/// uses that id to run the gateway's checkout, then calls `/api/confirm_payment` with the result.
pub async fn create_payment_intent<B, G>(
    claims: Option<JwtClaims>,
    body: Result<web::Json<CreatePaymentIntentRequest>, actix_web::Error>,
    api: web::Data<OrderCommitApi<B, G>>,
) -> Result<HttpResponse, actix_web::Error>
where
    B: OrderCommitDatabase,
    G: PaymentGateway,
{
    let (caller, body) = authenticated_body(claims, body)?;
    let intent = NewPaymentIntent::from(body);
    debug!("💻️ POST create_payment_intent for {} (receipt {})", intent.amount, intent.receipt);
    let result = api.create_payment_intent(Some(&caller), intent).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(CreatePaymentIntentResponse { order_id: result.id }))
}

route!(confirm_payment => Post "/confirm_payment" impl OrderCommitDatabase, PaymentGateway);
/// Route handler for the confirmPayment callable
///
/// Verifies the gateway's payment signature and commits the order, returning the order record's id as
/// `firestoreOrderId`. Confirming an already committed payment returns the original order's id.
pub async fn confirm_payment<B, G>(
    claims: Option<JwtClaims>,
    body: Result<web::Json<ConfirmPaymentRequest>, actix_web::Error>,
    api: web::Data<OrderCommitApi<B, G>>,
) -> Result<HttpResponse, actix_web::Error>
where
    B: OrderCommitDatabase,
    G: PaymentGateway,
{
    let (caller, body) = authenticated_body(claims, body)?;
    let confirmation = PaymentConfirmation::from(body);
    debug!("💻️ POST confirm_payment for payment {} on {}", confirmation.payment_id, confirmation.intent_id);
    let result = api.confirm_payment(Some(&caller), confirmation).await.map_err(ServerError::from)?;
    let order = result.into_order();
    Ok(HttpResponse::Ok().json(ConfirmPaymentResponse { firestore_order_id: order.id }))
}
