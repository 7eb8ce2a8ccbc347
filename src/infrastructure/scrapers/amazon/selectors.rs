//! CSS selectors for Amazon markup. These are the first thing to revisit when
//! parsing starts coming back empty.

use once_cell::sync::Lazy;
use scraper::Selector;

fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

pub mod search {
    use super::*;

    pub static RESULT: Lazy<Selector> =
        Lazy::new(|| sel("div[data-component-type='s-search-result']"));

    pub const ASIN_ATTR: &str = "data-asin";

    pub const TITLE: &[&str] = &[
        "h2 a span",
        "h2 span",
        ".a-size-medium.a-text-normal",
        ".a-size-base-plus.a-text-normal",
    ];

    pub const IMAGE: &[&str] = &["img.s-image", ".s-product-image-container img"];

    pub const BRAND: &[&str] = &["h5.s-line-clamp-1 span", ".s-line-clamp-1 .a-size-base-plus"];

    pub static PRICE_CURRENT: Lazy<Selector> = Lazy::new(|| {
        sel(".a-price:not([data-a-strike]):not(.a-text-price) .a-offscreen")
    });

    pub static PRICE_LIST: Lazy<Selector> = Lazy::new(|| {
        sel(".a-price[data-a-strike] .a-offscreen, .a-text-price .a-offscreen")
    });

    pub static SPONSORED: Lazy<Selector> = Lazy::new(|| {
        sel(".puis-sponsored-label-text, .s-sponsored-label-text, .puis-label-popover-default")
    });
}

pub mod product {
    use super::*;

    pub const TITLE: &[&str] = &["#productTitle", "#title span", "h1#title"];

    pub const IMAGE: &[&str] = &["#landingImage", "#imgTagWrapperId img", "#main-image"];

    pub const IMAGE_ATTRS: &[&str] = &["data-old-hires", "src"];

    pub const BRAND: &[&str] = &["#bylineInfo", ".po-brand .po-break-word"];
}

/// Price candidate strategies, in priority order.
pub mod price {
    use super::*;

    pub static PRICE_TO_PAY: Lazy<Selector> =
        Lazy::new(|| sel(".priceToPay .a-offscreen, .apexPriceToPay .a-offscreen"));

    pub static CORE_PRICE: Lazy<Selector> = Lazy::new(|| {
        sel("#corePrice_feature_div .a-price .a-offscreen, \
             #corePriceDisplay_desktop_feature_div .a-price .a-offscreen, \
             #apex_desktop .a-price .a-offscreen")
    });

    pub static LEGACY_BLOCK: Lazy<Selector> = Lazy::new(|| {
        sel("#priceblock_dealprice, #priceblock_ourprice, #priceblock_saleprice, \
             #price_inside_buybox, #newBuyBoxPrice, #kindle-price, \
             #listPrice, .priceBlockStrikePriceString, .a-text-strike")
    });

    pub static PRICE_WHOLE: Lazy<Selector> = Lazy::new(|| sel(".a-price-whole"));

    pub static PRICE_FRACTION: Lazy<Selector> = Lazy::new(|| sel(".a-price-fraction"));

    pub static ANY_OFFSCREEN: Lazy<Selector> = Lazy::new(|| sel(".a-price .a-offscreen"));
}

pub mod errors {
    use super::*;

    pub static CAPTCHA: Lazy<Selector> = Lazy::new(|| {
        sel("form[action*='validateCaptcha'], input#captchacharacters")
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_compile() {
        let _ = &*search::RESULT;
        let _ = &*search::PRICE_CURRENT;
        let _ = &*search::PRICE_LIST;
        let _ = &*search::SPONSORED;
        let _ = &*price::PRICE_TO_PAY;
        let _ = &*price::CORE_PRICE;
        let _ = &*price::LEGACY_BLOCK;
        let _ = &*price::PRICE_WHOLE;
        let _ = &*price::PRICE_FRACTION;
        let _ = &*price::ANY_OFFSCREEN;
        let _ = &*errors::CAPTCHA;

        for css in search::TITLE
            .iter()
            .chain(search::IMAGE)
            .chain(search::BRAND)
            .chain(product::TITLE)
            .chain(product::IMAGE)
            .chain(product::BRAND)
        {
            assert!(Selector::parse(css).is_ok(), "bad selector {}", css);
        }
    }
}
