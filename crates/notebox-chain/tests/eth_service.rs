//! Ethereum token service against a mocked JSON-RPC node.

use std::time::Duration;

use notebox_chain::abi;
use notebox_chain::{ChainConfig, ChainError, EthTokenService, TokenMintService, SUPPLY_CAP};
use notebox_core::{Price, TokenId, WalletAddress};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const MINTER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
const AUTHOR: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
const TX: &str = "0x9fc76417374aa880d4449a1f7f31ec597f00b1f6f3dd2d66f4c9c6c445836d8b";

fn service(server: &MockServer, timeout: Duration) -> EthTokenService {
    let mut config = ChainConfig::new(
        url::Url::parse(&server.uri()).unwrap(),
        WalletAddress::new(CONTRACT).unwrap(),
        WalletAddress::new(MINTER).unwrap(),
    );
    config.confirmation_timeout = timeout;
    config.poll_interval = Duration::from_millis(10);
    config.request_timeout = Duration::from_millis(500);
    EthTokenService::new(config).unwrap()
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn word(value: u128) -> String {
    format!("0x{}", hex::encode(abi::encode_uint(value)))
}

fn receipt(status: &str, logs: Value) -> Value {
    json!({
        "transactionHash": TX,
        "blockNumber": "0x1b4",
        "status": status,
        "logs": logs,
    })
}

async fn mount_send(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_sendTransaction"})))
        .respond_with(rpc_result(json!(TX)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_receipt(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(rpc_result(body))
        .mount(server)
        .await;
}

async fn sent_transaction(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let send = requests
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap())
        .find(|b| b["method"] == "eth_sendTransaction")
        .unwrap();
    send["params"][0].clone()
}

#[tokio::test]
async fn mint_reads_token_id_from_indexed_event_topic() {
    let server = MockServer::start().await;
    mount_send(&server).await;
    mount_receipt(
        &server,
        receipt(
            "0x1",
            json!([{
                "address": CONTRACT,
                "topics": [abi::event_topic("mintEvent(uint256)"), word(7)],
                "data": "0x"
            }]),
        ),
    )
    .await;

    let svc = service(&server, Duration::from_secs(2));
    let owner = WalletAddress::new(AUTHOR).unwrap();
    let token = svc.mint(&owner, Price::parse("0.5").unwrap()).await.unwrap();
    assert_eq!(token, TokenId::new(7));

    let tx = sent_transaction(&server).await;
    assert_eq!(tx["from"], MINTER);
    assert_eq!(tx["to"], CONTRACT.to_ascii_lowercase());
    let expected = abi::encode_call(
        "initializeToken(address,uint256,uint256)",
        &[
            abi::encode_address(&owner).unwrap(),
            abi::encode_uint(SUPPLY_CAP),
            abi::encode_uint(500_000_000_000_000_000),
        ],
    );
    assert_eq!(tx["data"], expected);
}

#[tokio::test]
async fn mint_falls_back_to_event_data_word() {
    let server = MockServer::start().await;
    mount_send(&server).await;
    mount_receipt(
        &server,
        receipt(
            "0x1",
            json!([
                {"address": "0x0000000000000000000000000000000000000001", "topics": [abi::event_topic("mintEvent(uint256)")], "data": word(1)},
                {"address": CONTRACT, "topics": [abi::event_topic("mintEvent(uint256)")], "data": word(42)}
            ]),
        ),
    )
    .await;

    let svc = service(&server, Duration::from_secs(2));
    let token = svc
        .mint(&WalletAddress::new(AUTHOR).unwrap(), Price::parse("1").unwrap())
        .await
        .unwrap();
    assert_eq!(token, TokenId::new(42));
}

#[tokio::test]
async fn mint_waits_for_pending_receipt() {
    let server = MockServer::start().await;
    mount_send(&server).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(rpc_result(Value::Null))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_receipt(
        &server,
        receipt(
            "0x1",
            json!([{"address": CONTRACT, "topics": [abi::event_topic("mintEvent(uint256)"), word(3)], "data": "0x"}]),
        ),
    )
    .await;

    let svc = service(&server, Duration::from_secs(2));
    let token = svc
        .mint(&WalletAddress::new(AUTHOR).unwrap(), Price::parse("1").unwrap())
        .await
        .unwrap();
    assert_eq!(token, TokenId::new(3));
}

#[tokio::test]
async fn submission_failure_is_not_retried_or_polled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_sendTransaction"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 1,
            "error": {"code": -32000, "message": "insufficient funds for gas"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(rpc_result(Value::Null))
        .expect(0)
        .mount(&server)
        .await;

    let svc = service(&server, Duration::from_secs(2));
    let err = svc
        .mint(&WalletAddress::new(AUTHOR).unwrap(), Price::parse("1").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::Submission(_)), "got {err:?}");
}

#[tokio::test]
async fn unconfirmed_mint_times_out() {
    let server = MockServer::start().await;
    mount_send(&server).await;
    mount_receipt(&server, Value::Null).await;

    let svc = service(&server, Duration::from_millis(100));
    let err = svc
        .mint(&WalletAddress::new(AUTHOR).unwrap(), Price::parse("1").unwrap())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ChainError::ConfirmationTimeout { ref tx_hash, .. } if tx_hash == TX),
        "got {err:?}"
    );
}

#[tokio::test]
async fn hung_receipt_request_is_cut_off_at_the_confirmation_deadline() {
    let server = MockServer::start().await;
    mount_send(&server).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(rpc_result(Value::Null).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let mut config = ChainConfig::new(
        url::Url::parse(&server.uri()).unwrap(),
        WalletAddress::new(CONTRACT).unwrap(),
        WalletAddress::new(MINTER).unwrap(),
    );
    config.confirmation_timeout = Duration::from_millis(200);
    config.request_timeout = Duration::from_secs(60);
    let svc = EthTokenService::new(config).unwrap();

    let author = WalletAddress::new(AUTHOR).unwrap();
    let mint = svc.mint(&author, Price::parse("1").unwrap());
    let err = tokio::time::timeout(Duration::from_secs(3), mint)
        .await
        .expect("mint must return within its confirmation deadline")
        .unwrap_err();
    assert!(
        matches!(err, ChainError::ConfirmationTimeout { ref tx_hash, .. } if tx_hash == TX),
        "got {err:?}"
    );
}

#[tokio::test]
async fn stalled_submission_fails_as_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_sendTransaction"})))
        .respond_with(rpc_result(json!(TX)).set_delay(Duration::from_secs(30)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(rpc_result(Value::Null))
        .expect(0)
        .mount(&server)
        .await;

    let svc = service(&server, Duration::from_secs(2));
    let author = WalletAddress::new(AUTHOR).unwrap();
    let purchase = svc.purchase(
        TokenId::new(7),
        &author,
        Price::parse("1").unwrap(),
    );
    let err = tokio::time::timeout(Duration::from_secs(3), purchase)
        .await
        .expect("purchase must return within the request timeout")
        .unwrap_err();
    assert!(matches!(err, ChainError::Submission(_)), "got {err:?}");
}

#[tokio::test]
async fn reverted_mint_is_reported() {
    let server = MockServer::start().await;
    mount_send(&server).await;
    mount_receipt(&server, receipt("0x0", json!([]))).await;

    let svc = service(&server, Duration::from_secs(2));
    let err = svc
        .mint(&WalletAddress::new(AUTHOR).unwrap(), Price::parse("1").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::Reverted { .. }), "got {err:?}");
}

#[tokio::test]
async fn receipt_without_mint_event_is_event_missing() {
    let server = MockServer::start().await;
    mount_send(&server).await;
    mount_receipt(
        &server,
        receipt(
            "0x1",
            json!([{"address": CONTRACT, "topics": [abi::event_topic("Transfer(address,address,uint256)")], "data": "0x"}]),
        ),
    )
    .await;

    let svc = service(&server, Duration::from_secs(2));
    let err = svc
        .mint(&WalletAddress::new(AUTHOR).unwrap(), Price::parse("1").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::EventMissing { .. }), "got {err:?}");
}

#[tokio::test]
async fn purchase_pays_listed_price() {
    let server = MockServer::start().await;
    mount_send(&server).await;
    mount_receipt(&server, receipt("0x1", json!([]))).await;

    let svc = service(&server, Duration::from_secs(2));
    let buyer = WalletAddress::new(AUTHOR).unwrap();
    let receipt = svc
        .purchase(TokenId::new(7), &buyer, Price::parse("0.25").unwrap())
        .await
        .unwrap();
    assert_eq!(receipt.tx_hash, TX);
    assert_eq!(receipt.block_number, 436);
    assert_eq!(receipt.value_wei, 250_000_000_000_000_000);

    let tx = sent_transaction(&server).await;
    assert_eq!(tx["from"], AUTHOR);
    assert_eq!(tx["value"], abi::to_quantity(250_000_000_000_000_000));
    assert_eq!(tx["data"], abi::encode_call("purchase(uint256)", &[abi::encode_uint(7)]));
}
