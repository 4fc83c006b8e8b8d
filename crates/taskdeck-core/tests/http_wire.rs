use serde_json::{Value, json};
use taskdeck_core::facade::TaskFacade;
use taskdeck_core::repository::{HttpTaskRepository, TaskRepository};
use taskdeck_core::session::Session;
use taskdeck_core::users::{self, HttpUserRepository};
use taskdeck_shared::{DeleteTaskRequest, UpdateTaskRequest};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Captured {
    method: String,
    path: String,
    authorization: Option<String>,
    body: Option<Value>,
}

/// Serves one canned `(status, body)` per connection, in order, and reports
/// what each request looked like.
async fn serve(
    replies: Vec<(u16, Value)>,
) -> (String, mpsc::UnboundedReceiver<Captured>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base = format!("http://{}/api", listener.local_addr().expect("addr"));
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        for (status, reply) in replies {
            let (mut socket, _) = listener.accept().await.expect("accept");

            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            let header_end = loop {
                let read = socket.read(&mut buf).await.expect("read");
                assert!(read > 0, "connection closed before headers");
                raw.extend_from_slice(&buf[..read]);
                if let Some(pos) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
            let mut lines = head.lines();
            let mut request_line = lines.next().expect("request line").split_whitespace();
            let method = request_line.next().expect("method").to_string();
            let path = request_line.next().expect("path").to_string();

            let mut authorization = None;
            let mut content_length = 0usize;
            for line in lines {
                if let Some((name, value)) = line.split_once(':') {
                    match name.trim().to_ascii_lowercase().as_str() {
                        "authorization" => authorization = Some(value.trim().to_string()),
                        "content-length" => {
                            content_length = value.trim().parse().expect("content length")
                        }
                        _ => {}
                    }
                }
            }

            while raw.len() < header_end + content_length {
                let read = socket.read(&mut buf).await.expect("read body");
                assert!(read > 0, "connection closed before body");
                raw.extend_from_slice(&buf[..read]);
            }
            let body = (content_length > 0).then(|| {
                serde_json::from_slice(&raw[header_end..header_end + content_length])
                    .expect("json body")
            });

            tx.send(Captured {
                method,
                path,
                authorization,
                body,
            })
            .expect("report request");

            let payload = reply.to_string();
            let response = format!(
                "HTTP/1.1 {status} X\r\n\
                 content-type: application/json\r\n\
                 content-length: {}\r\n\
                 connection: close\r\n\r\n{payload}",
                payload.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            socket.shutdown().await.ok();
        }
    });

    (base, rx, handle)
}

#[tokio::test]
async fn anonymous_requests_send_literal_null_bearer() {
    let (base, mut seen, server) = serve(vec![(
        200,
        json!({ "success": true, "message": "ok", "data": [], "count": 0, "id_user": 5 }),
    )])
    .await;

    let repository = HttpTaskRepository::new(&base, Session::anonymous()).expect("repository");
    let tasks = TaskFacade::new(repository).list().await.expect("list");
    assert!(tasks.is_empty());

    let request = seen.recv().await.expect("captured");
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/api/tasks");
    assert_eq!(request.authorization.as_deref(), Some("Bearer null"));
    assert_eq!(request.body, None);
    server.await.expect("server");
}

#[tokio::test]
async fn update_and_delete_carry_the_id_in_the_body() {
    let (base, mut seen, server) = serve(vec![
        (
            200,
            json!({
                "success": true,
                "data": { "id": 4, "title": "Leer", "priority": 1, "is_done": true }
            }),
        ),
        (200, json!({ "success": true, "data": null })),
    ])
    .await;

    let session = Session::new(Some("tok-123".to_string()));
    let repository = HttpTaskRepository::new(&base, session).expect("repository");

    let envelope = repository
        .update(&UpdateTaskRequest::toggle("4", false))
        .await
        .expect("update");
    assert!(envelope.success);

    let patch = seen.recv().await.expect("captured patch");
    assert_eq!(patch.method, "PATCH");
    assert_eq!(patch.path, "/api/tasks");
    assert_eq!(patch.authorization.as_deref(), Some("Bearer tok-123"));
    assert_eq!(patch.body, Some(json!({ "id": "4", "is_done": true })));

    repository
        .delete(&DeleteTaskRequest {
            id: "4".to_string(),
        })
        .await
        .expect("delete");

    let delete = seen.recv().await.expect("captured delete");
    assert_eq!(delete.method, "DELETE");
    assert_eq!(delete.path, "/api/tasks");
    assert_eq!(delete.body, Some(json!({ "id": "4" })));
    server.await.expect("server");
}

#[tokio::test]
async fn http_errors_surface_from_the_repository_untouched() {
    let (base, _seen, server) = serve(vec![(401, json!({ "message": "Token inválido" }))]).await;

    let repository = HttpTaskRepository::new(&base, Session::anonymous()).expect("repository");
    let err = repository.list().await.expect_err("401 must fail");
    assert_eq!(err.status().map(|status| status.as_u16()), Some(401));
    server.await.expect("server");
}

#[tokio::test]
async fn first_login_provisions_the_account() {
    let (base, mut seen, server) = serve(vec![
        (404, json!({ "success": false, "message": "Usuario no encontrado" })),
        (
            201,
            json!({ "success": true, "message": "Usuario creado", "token": "fresh" }),
        ),
    ])
    .await;

    let repository = HttpUserRepository::new(&base).expect("users");
    let session = Session::anonymous();
    let token = users::login(&repository, &session, "ana@example.com")
        .await
        .expect("login");

    assert_eq!(token, "fresh");
    assert_eq!(session.token().as_deref(), Some("fresh"));

    let lookup = seen.recv().await.expect("captured lookup");
    assert_eq!(lookup.method, "GET");
    assert_eq!(lookup.path, "/api/users/ana@example.com");
    assert_eq!(lookup.authorization, None);

    let create = seen.recv().await.expect("captured create");
    assert_eq!(create.method, "POST");
    assert_eq!(create.path, "/api/users");
    assert_eq!(create.body, Some(json!({ "mail": "ana@example.com" })));
    server.await.expect("server");
}
