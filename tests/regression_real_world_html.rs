use page_interactions::{InteractionConfig, Page, Result};

// A full storefront page in the shape real templates render: doctype,
// head metadata, comments, entities, a style block, and markup noise
// around the elements the bindings care about.
const STOREFRONT: &str = r##"
<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Corner Shop &mdash; Fresh picks</title>
  <link rel="stylesheet" href="/static/css/main.css">
  <style>
    .main-nav > .nav-link { transition: transform 0.2s; }
  </style>
</head>
<body>
  <!-- fixed header -->
  <nav class="main-nav" style="height: 64px">
    <a class="nav-link" href="#products">Products</a>
    <a class="nav-link" href="#story">Our story</a>
    <a class="nav-link external" href="/cart">Cart &amp; checkout</a>
  </nav>

  <header class="hero" style="height: 736px">
    <h1>Fresh picks, every week</h1>
    <p>Seasonal produce &amp; pantry staples.</p>
    <a class="scroll-down" href="#products" aria-label="Scroll to products">&#8595;</a>
  </header>

  <section id="products" class="grid" style="height: 1200px">
    <article class="card"><h2>Heirloom tomatoes</h2></article>
    <article class="card"><h2>Sourdough loaf</h2></article>
  </section>

  <section id="story" style="height: 600px">
    <h2>Our story</h2>
  </section>
</body>
</html>
"##;

#[test]
fn storefront_template_parses_and_installs() -> Result<()> {
    let mut page = Page::from_html(STOREFRONT)?;
    page.install_interactions(&InteractionConfig::default())?;

    page.assert_text(".hero h1", "Fresh picks, every week")?;
    page.assert_text("a.external", "Cart & checkout")?;
    assert_eq!(page.query_all(".nav-link")?.len(), 3);
    Ok(())
}

#[test]
fn bindings_work_through_head_and_wrapper_markup() -> Result<()> {
    let mut page = Page::from_html(STOREFRONT)?;
    page.install_interactions(&InteractionConfig::default())?;

    page.click(".scroll-down")?;
    page.flush_scroll()?;
    page.assert_scroll_offset(page.document_top("#products")?)?;
    page.assert_style(".main-nav", "background-color", "rgba(10, 10, 10, 0.98)")?;

    page.hover("a.nav-link.external")?;
    page.assert_style("a.nav-link.external", "transform", "translateY(-3px)")?;
    Ok(())
}

#[test]
fn style_block_selectors_do_not_confuse_the_parser() -> Result<()> {
    let page = Page::from_html(STOREFRONT)?;
    // The `>` inside the style block is raw text, not markup.
    page.assert_text("style", ".main-nav > .nav-link { transition: transform 0.2s; }")?;
    Ok(())
}
