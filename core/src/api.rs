use crate::errors::AppError;
use crate::parser::{parse_address, parse_amount};
use crate::session::{SessionStore, TokenSession};
use crate::token::{TokenFactory, TxReceipt};
use crate::transfer::guarded_transfer_from;
use alloy::primitives::Address;
use axum::{
    extract::{rejection::QueryRejection, Query},
    http::Uri,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Shared state handed to every handler.
pub struct AppState {
    pub factory: Arc<dyn TokenFactory>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(factory: Arc<dyn TokenFactory>) -> Self {
        Self {
            factory,
            sessions: SessionStore::new(),
        }
    }
}

// ── Request parameters ────────────────────────────────────────────────────────

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoadParams {
    #[param(example = "0x5FbDB2315678afecb367f032d93F642f64180aa3")]
    address: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipientParams {
    #[param(example = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8")]
    to: String,
    #[param(example = "1000000000000000000")]
    amount: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BurnParams {
    #[param(example = "1000")]
    amount: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApproveParams {
    spender: String,
    amount: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransferFromParams {
    from: String,
    to: String,
    amount: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BalanceParams {
    account: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AllowanceParams {
    owner: String,
    spender: String,
}

// ── Responses ─────────────────────────────────────────────────────────────────

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    #[schema(example = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b")]
    transaction_hash: String,
    #[schema(example = "12")]
    block_number: Option<String>,
    #[schema(example = "51234")]
    gas_used: String,
    #[schema(example = "0x1")]
    status: String,
    contract_address: String,
}

impl ReceiptResponse {
    fn new(receipt: &TxReceipt, contract: Address) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash.to_string(),
            block_number: receipt.block_number.map(|n| n.to_string()),
            gas_used: receipt.gas_used.to_string(),
            status: receipt.status_code().to_string(),
            contract_address: contract.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    message: String,
    contract_address: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    balance: String,
    account: String,
    contract_address: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TotalSupplyResponse {
    total_supply: String,
    contract_address: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceResponse {
    allowance: String,
    owner: String,
    spender: String,
    contract_address: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    #[schema(example = "CQToken")]
    name: String,
    #[schema(example = "CQ")]
    symbol: String,
    #[schema(example = 18)]
    decimals: u8,
    owner: String,
    contract_address: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    contract_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

// ── Contract lifecycle ────────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/erc20test/deploy",
    responses(
        (status = 200, description = "Contract deployed and made current", body = ReceiptResponse),
        (status = 409, description = "Deployment transaction failed"),
        (status = 502, description = "RPC failure")
    ),
    tag = "Contract"
)]
pub async fn deploy(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ReceiptResponse>, AppError> {
    tracing::info!("Deploying ERC20Test contract...");
    let deployment = state.factory.deploy().await?;
    state
        .sessions
        .replace(TokenSession::new(deployment.client))
        .await;
    Ok(Json(ReceiptResponse::new(
        &deployment.receipt,
        deployment.address,
    )))
}

#[utoipa::path(
    post,
    path = "/api/erc20test/load",
    params(LoadParams),
    responses(
        (status = 200, description = "Contract loaded and made current", body = LoadResponse),
        (status = 400, description = "Invalid address or no contract code at address")
    ),
    tag = "Contract"
)]
pub async fn load(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<LoadParams>, QueryRejection>,
) -> Result<Json<LoadResponse>, AppError> {
    let q = params(query)?;
    let address = parse_address("address", &q.address)?;
    tracing::info!("Loading ERC20Test contract from address: {}", address);

    let client = state.factory.load(address).await?;
    state.sessions.replace(TokenSession::new(client)).await;

    Ok(Json(LoadResponse {
        message: "Contract loaded successfully".to_string(),
        contract_address: address.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/erc20test/address",
    responses(
        (status = 200, description = "Address of the current contract, if any", body = AddressResponse)
    ),
    tag = "Contract"
)]
pub async fn contract_address(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<AddressResponse> {
    match state.sessions.current_address().await {
        Some(address) => Json(AddressResponse {
            contract_address: Some(address.to_string()),
            message: None,
        }),
        None => Json(AddressResponse {
            contract_address: None,
            message: Some("No contract loaded".to_string()),
        }),
    }
}

// ── Transactions ──────────────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/erc20test/mint",
    params(RecipientParams),
    responses(
        (status = 200, description = "Mint transaction mined", body = ReceiptResponse),
        (status = 503, description = "No contract deployed or loaded")
    ),
    tag = "Token"
)]
pub async fn mint(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<RecipientParams>, QueryRejection>,
) -> Result<Json<ReceiptResponse>, AppError> {
    let session = state.sessions.current().await?;
    let q = params(query)?;
    let to = parse_address("to", &q.to)?;
    let amount = parse_amount("amount", &q.amount)?;

    tracing::info!("Minting {} tokens to {}", amount, to);
    let receipt = session.client.mint(to, amount).await?;
    Ok(Json(ReceiptResponse::new(&receipt, session.address)))
}

#[utoipa::path(
    post,
    path = "/api/erc20test/burn",
    params(BurnParams),
    responses(
        (status = 200, description = "Burn transaction mined", body = ReceiptResponse),
        (status = 503, description = "No contract deployed or loaded")
    ),
    tag = "Token"
)]
pub async fn burn(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<BurnParams>, QueryRejection>,
) -> Result<Json<ReceiptResponse>, AppError> {
    let session = state.sessions.current().await?;
    let q = params(query)?;
    let amount = parse_amount("amount", &q.amount)?;

    tracing::info!("Burning {} tokens", amount);
    let receipt = session.client.burn(amount).await?;
    Ok(Json(ReceiptResponse::new(&receipt, session.address)))
}

#[utoipa::path(
    post,
    path = "/api/erc20test/transfer",
    params(RecipientParams),
    responses(
        (status = 200, description = "Transfer transaction mined", body = ReceiptResponse),
        (status = 503, description = "No contract deployed or loaded")
    ),
    tag = "Token"
)]
pub async fn transfer(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<RecipientParams>, QueryRejection>,
) -> Result<Json<ReceiptResponse>, AppError> {
    let session = state.sessions.current().await?;
    let q = params(query)?;
    let to = parse_address("to", &q.to)?;
    let amount = parse_amount("amount", &q.amount)?;

    tracing::info!("Transferring {} tokens to {}", amount, to);
    let receipt = session.client.transfer(to, amount).await?;
    Ok(Json(ReceiptResponse::new(&receipt, session.address)))
}

#[utoipa::path(
    post,
    path = "/api/erc20test/approve",
    params(ApproveParams),
    responses(
        (status = 200, description = "Approve transaction mined", body = ReceiptResponse),
        (status = 503, description = "No contract deployed or loaded")
    ),
    tag = "Token"
)]
pub async fn approve(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<ApproveParams>, QueryRejection>,
) -> Result<Json<ReceiptResponse>, AppError> {
    let session = state.sessions.current().await?;
    let q = params(query)?;
    let spender = parse_address("spender", &q.spender)?;
    let amount = parse_amount("amount", &q.amount)?;

    tracing::info!("Approving {} tokens for spender: {}", amount, spender);
    let receipt = session.client.approve(spender, amount).await?;
    Ok(Json(ReceiptResponse::new(&receipt, session.address)))
}

/// Third-party transfer spent from the operator's allowance, with balance and
/// allowance checked before anything is submitted.
#[utoipa::path(
    post,
    path = "/api/erc20test/transferFrom",
    params(TransferFromParams),
    responses(
        (status = 200, description = "TransferFrom transaction mined successfully", body = ReceiptResponse),
        (status = 422, description = "Insufficient balance or allowance"),
        (status = 409, description = "Transaction failed or reverted on chain"),
        (status = 503, description = "No contract deployed or loaded")
    ),
    tag = "Token"
)]
pub async fn transfer_from(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<TransferFromParams>, QueryRejection>,
) -> Result<Json<ReceiptResponse>, AppError> {
    let session = state.sessions.current().await?;
    let q = params(query)?;
    let from = parse_address("from", &q.from)?;
    let to = parse_address("to", &q.to)?;
    let amount = parse_amount("amount", &q.amount)?;

    let receipt = guarded_transfer_from(
        session.client.as_ref(),
        from,
        to,
        amount,
        state.factory.operator(),
    )
    .await
    .inspect_err(|e| tracing::error!("TransferFrom failed: {}", e))?;

    Ok(Json(ReceiptResponse::new(&receipt, session.address)))
}

// ── Views ─────────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/erc20test/balance",
    params(BalanceParams),
    responses(
        (status = 200, description = "Token balance of the account", body = BalanceResponse),
        (status = 503, description = "No contract deployed or loaded")
    ),
    tag = "Token"
)]
pub async fn balance_of(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<BalanceParams>, QueryRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let session = state.sessions.current().await?;
    let q = params(query)?;
    let account = parse_address("account", &q.account)?;

    tracing::info!("Getting balance for account: {}", account);
    let balance = session.client.balance_of(account).await?;
    Ok(Json(BalanceResponse {
        balance: balance.to_string(),
        account: account.to_string(),
        contract_address: session.address.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/erc20test/totalSupply",
    responses(
        (status = 200, description = "Total token supply", body = TotalSupplyResponse),
        (status = 503, description = "No contract deployed or loaded")
    ),
    tag = "Token"
)]
pub async fn total_supply(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<TotalSupplyResponse>, AppError> {
    let session = state.sessions.current().await?;

    tracing::info!("Getting total supply");
    let supply = session.client.total_supply().await?;
    Ok(Json(TotalSupplyResponse {
        total_supply: supply.to_string(),
        contract_address: session.address.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/erc20test/allowance",
    params(AllowanceParams),
    responses(
        (status = 200, description = "Remaining allowance of spender over owner's tokens", body = AllowanceResponse),
        (status = 503, description = "No contract deployed or loaded")
    ),
    tag = "Token"
)]
pub async fn allowance(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<AllowanceParams>, QueryRejection>,
) -> Result<Json<AllowanceResponse>, AppError> {
    let session = state.sessions.current().await?;
    let q = params(query)?;
    let owner = parse_address("owner", &q.owner)?;
    let spender = parse_address("spender", &q.spender)?;

    tracing::info!("Getting allowance for owner {} and spender {}", owner, spender);
    let allowance = session.client.allowance(owner, spender).await?;
    Ok(Json(AllowanceResponse {
        allowance: allowance.to_string(),
        owner: owner.to_string(),
        spender: spender.to_string(),
        contract_address: session.address.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/erc20test/metadata",
    responses(
        (status = 200, description = "Token name, symbol, decimals and owner", body = MetadataResponse),
        (status = 503, description = "No contract deployed or loaded")
    ),
    tag = "Token"
)]
pub async fn metadata(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<MetadataResponse>, AppError> {
    let session = state.sessions.current().await?;
    let meta = session.client.metadata().await?;
    Ok(Json(MetadataResponse {
        name: meta.name,
        symbol: meta.symbol,
        decimals: meta.decimals,
        owner: meta.owner.to_string(),
        contract_address: session.address.to_string(),
    }))
}

// ── Router ────────────────────────────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        deploy, load, contract_address,
        mint, burn, transfer, approve, transfer_from,
        balance_of, total_supply, allowance, metadata
    ),
    components(schemas(
        ReceiptResponse, LoadResponse, AddressResponse,
        BalanceResponse, TotalSupplyResponse, AllowanceResponse, MetadataResponse
    )),
    tags(
        (name = "Contract", description = "Deploy and select the ERC20Test contract"),
        (name = "Token", description = "ERC-20 token operations")
    ),
    info(
        title = "ERC20 Gateway API",
        version = "0.1.0",
        description = "HTTP gateway for deploying and operating an ERC-20 token contract"
    )
)]
pub struct ApiDoc;

async fn health_check() -> &'static str {
    "OK"
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/deploy", post(deploy))
        .route("/load", post(load))
        .route("/address", get(contract_address))
        .route("/mint", post(mint))
        .route("/burn", post(burn))
        .route("/transfer", post(transfer))
        .route("/approve", post(approve))
        .route("/transferFrom", post(transfer_from))
        .route("/balance", get(balance_of))
        .route("/totalSupply", get(total_supply))
        .route("/allowance", get(allowance))
        .route("/metadata", get(metadata));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(|| async { "Hello from the ERC20 gateway! See /swagger-ui" }))
        .route("/health", get(health_check))
        .nest("/api/erc20test", api)
        .fallback(not_found)
        .layer(Extension(state))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
}
