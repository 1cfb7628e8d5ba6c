//! Home Page

use leptos::prelude::*;

use crate::components::DonateButton;

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <div class="home">
            <header class="hero">
                <h1>"Support our work"</h1>
                <p class="tagline">"Donations go straight from your bank, no card needed."</p>
                <div class="cta">
                    <DonateButton />
                </div>
            </header>

            <section class="amounts">
                <DonateButton label="Give £5" amount_minor=500 />
                <DonateButton label="Give £10" amount_minor=1000 />
                <DonateButton label="Give £25" amount_minor=2500 />
            </section>
        </div>
    }
}
