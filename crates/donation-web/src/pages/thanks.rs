//! Thank-you Page
//!
//! Landing page for the provider's redirect after the donor authorises the payment.

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

#[component]
pub fn ThanksPage() -> impl IntoView {
    let query = use_query_map();
    let payment_id = move || query.read().get("payment_id");

    view! {
        <div class="thanks">
            <h1>"Thank you!"</h1>
            <p>"Your donation is on its way. Your bank will confirm once it has been sent."</p>
            <Show when=move || payment_id().is_some()>
                <p class="reference">"Reference: " {payment_id}</p>
            </Show>
            <a href="/" class="btn">"Back"</a>
        </div>
    }
}
