use reqwest::header::LOCATION;
use reqwest::StatusCode;

use stockroom_api::app::services::AppServices;
use stockroom_core::ArticleId;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, fresh in-memory store, ephemeral port.
        let app = stockroom_api::app::build_app(AppServices::in_memory());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Redirects are part of what we assert on.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            client,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn get_html(&self, path: &str) -> String {
        let res = self.get(path).await;
        assert_eq!(res.status(), StatusCode::OK, "GET {path}");
        res.text().await.unwrap()
    }

    async fn post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// POST that must redirect; returns the `Location`.
    async fn post_redirect(&self, path: &str, form: &[(&str, &str)]) -> String {
        let res = self.post(path, form).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "POST {path}");
        location(&res)
    }

    async fn create_category(&self, name: &str) -> String {
        self.post_redirect(
            "/catalog/category/create",
            &[
                ("name", name),
                ("description", "Things for building"),
                ("examples", "hammer, saw"),
            ],
        )
        .await
    }

    async fn create_article(
        &self,
        category_url: &str,
        name: &str,
        price: &str,
        stock: &str,
    ) -> String {
        let category_id = last_segment(category_url);
        self.post_redirect(
            "/catalog/article/create",
            &[
                ("name", name),
                ("short_description", "A useful tool"),
                ("category", category_id),
                ("price", price),
                ("stock_number", stock),
                ("detail_description", "Forged steel, wooden handle."),
            ],
        )
        .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn location(res: &reqwest::Response) -> String {
    res.headers()
        .get(LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// `href` of the anchor whose text is exactly `text`.
fn link_to(html: &str, text: &str) -> String {
    let end = html
        .find(&format!("\">{text}</a>"))
        .unwrap_or_else(|| panic!("no link to {text}"));
    let start = html[..end].rfind("href=\"").unwrap() + "href=\"".len();
    html[start..end].to_string()
}

fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap()
}

#[tokio::test]
async fn health_and_root_redirect() {
    let srv = TestServer::spawn().await;

    assert_eq!(srv.get("/health").await.status(), StatusCode::OK);

    let res = srv.get("/").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/catalog/");

    let home = srv.get_html("/catalog/").await;
    assert!(home.contains("Categories</a>: 0"));
}

#[tokio::test]
async fn invalid_category_is_redisplayed_and_nothing_is_stored() {
    let srv = TestServer::spawn().await;

    let res = srv
        .post(
            "/catalog/category/create",
            &[("name", "   "), ("description", "d"), ("examples", "")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("Name must be specified."));
    assert!(body.contains("Examples must be specified."));
    assert!(!body.contains("Description must be specified."));
    // The entered values come back.
    assert!(body.contains("value=\"   \""));

    let list = srv.get_html("/catalog/category").await;
    assert!(list.contains("There are no categories yet."));
}

#[tokio::test]
async fn categories_are_listed_by_name_and_escaped() {
    let srv = TestServer::spawn().await;

    srv.create_category("Zeta").await;
    let url = srv.create_category("<b>Alpha</b>").await;
    assert!(url.starts_with("/catalog/category/"));

    let list = srv.get_html("/catalog/category").await;
    let alpha = list.find("&lt;b&gt;Alpha&lt;/b&gt;").expect("escaped name listed");
    let zeta = list.find("Zeta").unwrap();
    assert!(alpha < zeta);
    assert!(!list.contains("<b>Alpha</b>"));
}

#[tokio::test]
async fn category_update_detects_stale_versions() {
    let srv = TestServer::spawn().await;
    let url = srv.create_category("Tools").await;
    let update = format!("{url}/update");

    let form = srv.get_html(&update).await;
    assert!(form.contains("name=\"version\" value=\"1\""));

    let fields = |name: &'static str, version: &'static str| {
        vec![
            ("name", name),
            ("description", "Hand tools"),
            ("examples", "chisel"),
            ("version", version),
        ]
    };

    let saved = srv.post_redirect(&update, &fields("Hand tools", "1")).await;
    assert_eq!(saved, url);
    assert!(srv.get_html(&url).await.contains("Hand tools"));

    // Second writer still holds version 1.
    let res = srv.post(&update, &fields("Power tools", "1")).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = res.text().await.unwrap();
    assert!(body.contains("modified by someone else"));
    assert!(body.contains("name=\"version\" value=\"2\""));
    assert!(!srv.get_html(&url).await.contains("Power tools"));

    // No version at all replaces unconditionally.
    let res = srv
        .post(
            &update,
            &[("name", "Power tools"), ("description", "d"), ("examples", "drill")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn missing_and_malformed_ids_are_not_found() {
    let srv = TestServer::spawn().await;
    let unknown = ArticleId::new().to_string();

    for path in [
        "/catalog/category/not-a-uuid".to_string(),
        format!("/catalog/category/{unknown}"),
        format!("/catalog/article/{unknown}"),
        format!("/catalog/article/{unknown}/update"),
        "/catalog/inventory/42".to_string(),
    ] {
        assert_eq!(srv.get(&path).await.status(), StatusCode::NOT_FOUND, "{path}");
    }

    // Delete flows go back to the list instead.
    let res = srv.get("/catalog/category/nope/delete").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/catalog/category");

    let res = srv.post(&format!("/catalog/inventory/{unknown}/delete"), &[]).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/catalog/inventory");
}

#[tokio::test]
async fn article_validation_reports_every_broken_rule() {
    let srv = TestServer::spawn().await;
    let unknown_category = ArticleId::new().to_string();

    let res = srv
        .post(
            "/catalog/article/create",
            &[
                ("name", "A name that is definitely longer than thirty chars"),
                ("short_description", "ok"),
                ("category", unknown_category.as_str()),
                ("price", "0"),
                ("stock_number", "-1"),
                ("detail_description", "ok"),
            ],
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("Name must be at most 30 characters."));
    assert!(body.contains("Price must be a positive number."));
    assert!(body.contains("Stock number must be a non-negative integer."));
    assert!(body.contains("Category must be an existing category."));

    // Summary lists messages in form-field order.
    let pos = |msg: &str| body.find(msg).unwrap();
    assert!(pos("Name must be at most") < pos("Category must be an existing"));
    assert!(pos("Category must be an existing") < pos("Price must be a positive"));

    assert!(srv.get_html("/catalog/").await.contains("Articles: 0"));
}

#[tokio::test]
async fn oversized_price_is_a_form_error() {
    let srv = TestServer::spawn().await;
    let category = srv.create_category("Tools").await;

    let res = srv
        .post(
            "/catalog/article/create",
            &[
                ("name", "Gold hammer"),
                ("short_description", "Expensive"),
                ("category", last_segment(&category)),
                ("price", "100000000000000000"),
                ("stock_number", "1"),
                ("detail_description", "Solid gold."),
            ],
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("Price must be a positive number."));
}

fn article_fields<'a>(
    category_id: &'a str,
    name: &'a str,
    stock: &'a str,
    version: &'a str,
) -> Vec<(&'static str, &'a str)> {
    vec![
        ("name", name),
        ("short_description", "A useful tool"),
        ("category", category_id),
        ("price", "2.50"),
        ("stock_number", stock),
        ("detail_description", "Forged steel, wooden handle."),
        ("version", version),
    ]
}

#[tokio::test]
async fn article_update_saves_and_redisplays_errors() {
    let srv = TestServer::spawn().await;
    let category = srv.create_category("Tools").await;
    let category_id = last_segment(&category);
    let article = srv.create_article(&category, "Hammer", "2.50", "10").await;
    let update = format!("{article}/update");

    let res = srv
        .post(&update, &article_fields(category_id, "", "10", "1"))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("Name must be specified."));
    assert!(body.contains("name=\"version\" value=\"1\""));

    let to = srv
        .post_redirect(&update, &article_fields(category_id, "Claw hammer", "12", "1"))
        .await;
    assert_eq!(to, article);
    let page = srv.get_html(&article).await;
    assert!(page.contains("Claw hammer"));
    assert!(page.contains("<dd>12</dd>"));
}

#[tokio::test]
async fn article_page_links_its_own_category() {
    let srv = TestServer::spawn().await;
    let tools = srv.create_category("Tools").await;
    srv.create_category("Garden").await;
    let article = srv.create_article(&tools, "Hammer", "2.50", "1").await;

    let page = srv.get_html(&article).await;
    assert_eq!(link_to(&page, "Tools"), tools);
    assert!(!page.contains(">Garden</a>"));
}

#[tokio::test]
async fn stale_article_edit_cannot_undo_a_transfer() {
    let srv = TestServer::spawn().await;
    let category = srv.create_category("Tools").await;
    let category_id = last_segment(&category);
    let article = srv.create_article(&category, "Hammer", "2.50", "10").await;
    let update = format!("{article}/update");

    let form = srv.get_html(&update).await;
    assert!(form.contains("name=\"version\" value=\"1\""));

    srv.post_redirect(
        &format!("{article}/add_inventory"),
        &[("owner", "alice"), ("quantity", "4")],
    )
    .await;

    // The form still says stock 10 at version 1.
    let res = srv
        .post(&update, &article_fields(category_id, "Hammer", "10", "1"))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = res.text().await.unwrap();
    assert!(body.contains("modified by someone else"));
    assert!(body.contains("name=\"version\" value=\"2\""));

    assert!(srv.get_html(&article).await.contains("<dd>6</dd>"));
}

#[tokio::test]
async fn stock_transfer_merges_lines_and_updates_totals() {
    let srv = TestServer::spawn().await;
    let category = srv.create_category("Tools").await;
    let article = srv.create_article(&category, "Hammer", "2.50", "10").await;
    let transfer = format!("{article}/add_inventory");

    let to = srv
        .post_redirect(&transfer, &[("owner", "alice"), ("quantity", "4")])
        .await;
    assert_eq!(to, article);
    assert!(srv.get_html(&article).await.contains("<dd>6</dd>"));

    srv.post_redirect(&transfer, &[("owner", " alice "), ("quantity", "3")])
        .await;
    let page = srv.get_html(&article).await;
    assert!(page.contains("<dd>3</dd>"));
    assert!(page.contains("<option value=\"alice\">"));

    let list = srv.get_html("/catalog/inventory").await;
    assert_eq!(list.matches("alice").count(), 1);
    assert!(list.contains("<td>7</td><td>17.50</td>"));
}

#[tokio::test]
async fn insufficient_stock_is_a_json_error_and_changes_nothing() {
    let srv = TestServer::spawn().await;
    let category = srv.create_category("Tools").await;
    let article = srv.create_article(&category, "Saw", "10", "5").await;

    let res = srv
        .post(
            &format!("{article}/add_inventory"),
            &[("owner", "bob"), ("quantity", "6")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Insufficient stock");

    assert!(srv.get_html(&article).await.contains("<dd>5</dd>"));
    assert!(srv.get_html("/catalog/inventory").await.contains("There are no inventories yet."));
}

#[tokio::test]
async fn transfer_input_and_lookup_errors_are_json() {
    let srv = TestServer::spawn().await;

    let unknown = ArticleId::new().to_string();
    let res = srv
        .post(
            &format!("/catalog/article/{unknown}/add_inventory"),
            &[("owner", ""), ("quantity", "-1")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["owner", "quantity"]);

    let res = srv
        .post(
            &format!("/catalog/article/{unknown}/add_inventory"),
            &[("owner", "alice"), ("quantity", "1")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Article not found");

    // A body that is not a form still gets a JSON error.
    let res = srv
        .client
        .post(srv.url(&format!("/catalog/article/{unknown}/add_inventory")))
        .json(&serde_json::json!({ "owner": "alice", "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn deletes_are_refused_while_dependents_exist() {
    let srv = TestServer::spawn().await;
    let category = srv.create_category("Tools").await;
    let article = srv.create_article(&category, "Hammer", "5", "10").await;
    srv.post_redirect(
        &format!("{article}/add_inventory"),
        &[("owner", "carol"), ("quantity", "2")],
    )
    .await;

    // Category is held by the article.
    let res = srv.post(&format!("{category}/delete"), &[]).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("cannot be deleted"));
    assert!(body.contains("Hammer"));
    srv.get_html(&category).await;

    // Article is held by carol's inventory.
    let res = srv.post(&format!("{article}/delete"), &[]).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("carol"));
    assert!(body.contains("(2 held)"));
    srv.get_html(&article).await;

    // The inventory is not empty either.
    let list = srv.get_html("/catalog/inventory").await;
    let inventory = link_to(&list, "carol");
    let res = srv.post(&format!("{inventory}/delete"), &[]).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("still holds articles"));
    srv.get_html(&inventory).await;
}

#[tokio::test]
async fn deletes_without_dependents_remove_the_record() {
    let srv = TestServer::spawn().await;
    let category = srv.create_category("Tools").await;
    let article = srv.create_article(&category, "Hammer", "5", "10").await;

    let confirm = srv.get_html(&format!("{article}/delete")).await;
    assert!(confirm.contains("Do you really want to delete this article?"));

    // Article delete goes back to its category.
    let to = srv.post_redirect(&format!("{article}/delete"), &[]).await;
    assert_eq!(to, category);
    assert_eq!(srv.get(&article).await.status(), StatusCode::NOT_FOUND);

    let to = srv.post_redirect(&format!("{category}/delete"), &[]).await;
    assert_eq!(to, "/catalog/category");
    assert_eq!(srv.get(&category).await.status(), StatusCode::NOT_FOUND);

    let inventory = srv
        .post_redirect("/catalog/inventory/create", &[("owner", "dave")])
        .await;
    assert!(srv.get_html(&inventory).await.contains("This inventory is empty."));
    let to = srv.post_redirect(&format!("{inventory}/delete"), &[]).await;
    assert_eq!(to, "/catalog/inventory");
    assert_eq!(srv.get(&inventory).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_inventory_owner_is_rejected() {
    let srv = TestServer::spawn().await;

    let res = srv.post("/catalog/inventory/create", &[("owner", "  ")]).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("Owner must be specified."));
}
