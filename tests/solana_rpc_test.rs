//! JSON-RPC adapter tests against a local mock HTTP server

#[cfg(test)]
mod solana_rpc_tests {
    use mockito::{Matcher, Server};
    use report_attest::rpc::{LedgerRpc, RpcError, SolanaRpc};
    use serde_json::json;
    use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature};
    use std::time::Duration;

    fn rpc_for(server: &Server) -> SolanaRpc {
        SolanaRpc::new(server.url(), CommitmentConfig::confirmed(), Duration::from_secs(5))
    }

    fn method(name: &str) -> Matcher {
        Matcher::PartialJson(json!({ "method": name }))
    }

    #[tokio::test]
    async fn test_get_balance() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(method("getBalance"))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","result":{"context":{"slot":1},"value":1500000000},"id":1}"#)
            .create_async()
            .await;

        let balance = rpc_for(&server).get_balance(&Pubkey::new_unique()).await.unwrap();
        assert_eq!(balance, 1_500_000_000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_account() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(method("getAccountInfo"))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","result":{"context":{"slot":1},"value":null},"id":1}"#)
            .create_async()
            .await;

        let exists = rpc_for(&server).account_exists(&Pubkey::new_unique()).await.unwrap();
        assert!(!exists);
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(method("getTransaction"))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","result":null,"id":1}"#)
            .create_async()
            .await;

        let tx = rpc_for(&server)
            .get_transaction(&Signature::new_unique())
            .await
            .unwrap();
        assert!(tx.is_none());
    }

    #[tokio::test]
    async fn test_rpc_error_response_is_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","error":{"code":-32005,"message":"Node is behind by 42 slots"},"id":1}"#)
            .create_async()
            .await;

        let rpc = rpc_for(&server);
        let err = rpc.block_height().await.unwrap_err();
        assert!(matches!(err, RpcError::RpcResponse { .. }));
        assert!(err.to_string().contains(rpc.endpoint()));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) on localhost is not serving HTTP
        let rpc = SolanaRpc::new(
            "http://127.0.0.1:9",
            CommitmentConfig::confirmed(),
            Duration::from_secs(2),
        );
        let err = rpc.get_balance(&Pubkey::new_unique()).await.unwrap_err();
        assert!(matches!(
            err,
            RpcError::Transport { .. } | RpcError::Timeout { .. }
        ));
        assert!(err.is_retryable());
    }
}
