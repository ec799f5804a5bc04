//! App Router

use salvo::Router;

use crate::{auth, carts, orders, transactions, webhooks};

/// Routes that need no bearer token.
pub(crate) fn public_router() -> Router {
    Router::with_path("webhooks/blockchain").post(webhooks::blockchain::handler)
}

/// Bearer authenticated API routes.
pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .push(
            Router::with_path("cart")
                .get(carts::index::handler)
                .push(
                    Router::with_path("items")
                        .post(carts::add::handler)
                        .push(
                            Router::with_path("{item}")
                                .patch(carts::update::handler)
                                .delete(carts::remove::handler),
                        ),
                )
                .push(Router::with_path("clear").delete(carts::clear::handler))
                .push(Router::with_path("checkout").post(carts::checkout::handler)),
        )
        .push(Router::with_path("my-orders").get(orders::index::buying))
        .push(Router::with_path("market-orders").get(orders::index::selling))
        .push(
            Router::with_path("orders").post(orders::create::handler).push(
                Router::with_path("{order}")
                    .get(orders::get::handler)
                    .push(Router::with_path("confirm").patch(orders::actions::confirm))
                    .push(Router::with_path("process").patch(orders::actions::process))
                    .push(Router::with_path("ship").patch(orders::ship::handler))
                    .push(Router::with_path("deliver").patch(orders::actions::deliver))
                    .push(Router::with_path("complete").patch(orders::actions::complete))
                    .push(Router::with_path("cancel").patch(orders::actions::cancel))
                    .push(Router::with_path("refund").patch(orders::actions::refund))
                    .push(Router::with_path("rate").patch(orders::rate::handler)),
            ),
        )
        .push(
            Router::with_path("transactions")
                .get(transactions::index::handler)
                .push(Router::with_path("summary").get(transactions::summary::handler))
                .push(Router::with_path("funding").post(transactions::funding::handler))
                .push(Router::with_path("withdrawal").post(transactions::withdrawal::handler))
                .push(
                    Router::with_path("{transaction}")
                        .get(transactions::get::handler)
                        .push(Router::with_path("confirm").patch(transactions::confirm::handler))
                        .push(Router::with_path("cancel").patch(transactions::cancel::handler))
                        .push(Router::with_path("sync").post(transactions::sync::handler)),
                ),
        )
}
