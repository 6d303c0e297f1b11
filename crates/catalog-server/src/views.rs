//! Server-rendered HTML pages.
//!
//! Pages are built with `format!`. Every value that came from the database
//! or the request goes through [`escape`].

use catalog_types::{Category, FieldErrors, FormField, Product};
use std::collections::HashMap;
use std::fmt::Write;

const BOOTSTRAP_CSS: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@3.4.1/dist/css/bootstrap.min.css";

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, notices: &[String], body: &str) -> String {
    let mut alerts = String::new();
    for notice in notices {
        let _ = write!(
            alerts,
            r#"<div class="alert alert-info">{}</div>"#,
            escape(notice)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Catalog</title>
<link rel="stylesheet" href="{BOOTSTRAP_CSS}">
</head>
<body>
<nav class="navbar navbar-default">
<div class="container">
<a class="navbar-brand" href="/">Catalog</a>
<ul class="nav navbar-nav"><li><a href="/new">New product</a></li></ul>
</div>
</nav>
<div class="container">
{alerts}
{body}
</div>
</body>
</html>
"#,
        title = escape(title),
    )
}

/// The product list at `/`.
pub fn index_page(products: &[Product], categories: &[Category], notices: &[String]) -> String {
    let names: HashMap<i64, &str> = categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let body = if products.is_empty() {
        r#"<h1>Products</h1><p>No products yet. <a href="/new">Create one</a>.</p>"#.to_string()
    } else {
        let mut rows = String::new();
        for product in products {
            let category = names.get(&product.category_id).copied().unwrap_or("");
            let _ = write!(
                rows,
                r#"<tr><td>{id}</td><td><a href="/{id}/">{name}</a></td><td>{category}</td><td><a href="/{id}/edit">Edit</a> <a href="/{id}/delete">Delete</a></td></tr>"#,
                id = product.id,
                name = escape(&product.name),
                category = escape(category),
            );
        }
        format!(
            r#"<h1>Products</h1>
<table class="table">
<thead><tr><th>#</th><th>Product</th><th>Category</th><th></th></tr></thead>
<tbody>{rows}</tbody>
</table>"#
        )
    };

    layout("Products", notices, &body)
}

/// The product detail page at `/{id}/`.
///
/// `siblings` are the other products in the same category.
pub fn product_page(
    product: &Product,
    category: &Category,
    siblings: &[Product],
    notices: &[String],
) -> String {
    let mut body = format!(
        r#"<h1>{name}</h1>
<dl class="dl-horizontal">
<dt>Product#</dt><dd>{id}</dd>
<dt>Category</dt><dd>{category}</dd>
</dl>
<p><a class="btn btn-default" href="/{id}/edit">Edit</a> <a class="btn btn-danger" href="/{id}/delete">Delete</a></p>"#,
        id = product.id,
        name = escape(&product.name),
        category = escape(&category.name),
    );

    if !siblings.is_empty() {
        let _ = write!(body, "<h2>Also in {}</h2><ul>", escape(&category.name));
        for other in siblings {
            let _ = write!(
                body,
                r#"<li><a href="/{}/">{}</a></li>"#,
                other.id,
                escape(&other.name)
            );
        }
        body.push_str("</ul>");
    }

    layout(&product.name, notices, &body)
}

/// View model for the create and edit forms.
///
/// The category options are loaded before the view is built; rendering
/// never queries the database.
#[derive(Debug)]
pub struct ProductFormView<'a> {
    pub title: &'a str,
    pub action: String,
    pub name: &'a str,
    pub selected_category: String,
    pub categories: &'a [Category],
    pub errors: &'a FieldErrors,
}

fn field_errors(errors: &FieldErrors, field: FormField) -> String {
    errors
        .get(field)
        .iter()
        .map(|message| format!(r#"<p class="help-block">{}</p>"#, escape(message)))
        .collect()
}

fn group_class(errors: &FieldErrors, field: FormField) -> &'static str {
    if errors.get(field).is_empty() {
        "form-group"
    } else {
        "form-group has-error"
    }
}

/// The create/edit form page.
pub fn form_page(view: &ProductFormView<'_>, notices: &[String]) -> String {
    let mut options = String::new();
    for category in view.categories {
        let value = category.id.to_string();
        let selected = if value == view.selected_category {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            options,
            r#"<option value="{value}"{selected}>{}</option>"#,
            escape(&category.name)
        );
    }

    let body = format!(
        r#"<h1>{title}</h1>
<form method="post" action="{action}">
<div class="{name_class}">
<label for="name">Product</label>
<input class="form-control" id="name" name="name" type="text" value="{name}">
{name_errors}</div>
<div class="{category_class}">
<label for="category">Category</label>
<select class="form-control" id="category" name="category">{options}</select>
{category_errors}</div>
<input class="btn btn-primary" type="submit" value="Save">
</form>"#,
        title = escape(view.title),
        action = escape(&view.action),
        name = escape(view.name),
        name_class = group_class(view.errors, FormField::Name),
        name_errors = field_errors(view.errors, FormField::Name),
        category_class = group_class(view.errors, FormField::Category),
        category_errors = field_errors(view.errors, FormField::Category),
    );

    layout(view.title, notices, &body)
}

/// The page returned with a 404.
pub fn not_found_page() -> String {
    layout(
        "Not Found",
        &[],
        "<h1>Not Found</h1><p>The requested URL was not found on the server.</p>",
    )
}

/// The page returned with a 500.
pub fn error_page() -> String {
    layout(
        "Internal Server Error",
        &[],
        "<h1>Internal Server Error</h1><p>The server could not complete the request.</p>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> Category {
        Category {
            id: 1,
            name: "Tools".to_string(),
        }
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn index_lists_products_with_category_names() {
        let products = vec![Product {
            id: 3,
            name: "Ham<mer>".to_string(),
            category_id: 1,
        }];
        let html = index_page(&products, &[tools()], &["hi".to_string()]);
        assert!(html.contains("Ham&lt;mer&gt;"));
        assert!(html.contains("<td>Tools</td>"));
        assert!(html.contains(r#"href="/3/delete""#));
        assert!(html.contains(r#"<div class="alert alert-info">hi</div>"#));
    }

    #[test]
    fn form_marks_selected_category_and_errors() {
        let mut errors = FieldErrors::new();
        errors.add(FormField::Name, "This field is required.");
        let categories = vec![
            tools(),
            Category {
                id: 2,
                name: "Garden".to_string(),
            },
        ];
        let view = ProductFormView {
            title: "New product",
            action: "/new".to_string(),
            name: "",
            selected_category: "2".to_string(),
            categories: &categories,
            errors: &errors,
        };

        let html = form_page(&view, &[]);
        assert!(html.contains(r#"<option value="2" selected>Garden</option>"#));
        assert!(html.contains(r#"<option value="1">Tools</option>"#));
        assert!(html.contains("form-group has-error"));
        assert!(html.contains("This field is required."));
    }

    #[test]
    fn product_page_lists_siblings() {
        let product = Product {
            id: 1,
            name: "Hammer".to_string(),
            category_id: 1,
        };
        let saw = Product {
            id: 2,
            name: "Saw".to_string(),
            category_id: 1,
        };
        let html = product_page(&product, &tools(), &[saw], &[]);
        assert!(html.contains("<h1>Hammer</h1>"));
        assert!(html.contains("Also in Tools"));
        assert!(html.contains(r#"<a href="/2/">Saw</a>"#));
    }
}
