use std::{collections::HashMap, fmt, future::Future, mem, pin::Pin, task};

use jsonrpsee::core::ClientError;
use stader_basic_types::{
    abi::{self, Detokenize, Tokenize},
    ethabi, Address, BlockId, Bytes, CallRequest, TransactionReceipt, H256, U256,
};
use stader_eth_signer::SignerError;

use crate::EthInterface;

/// JSON-RPC client error enriched with the method name and its arguments.
#[derive(Debug)]
pub struct EnrichedClientError {
    inner_error: ClientError,
    method: &'static str,
    args: HashMap<&'static str, String>,
}

/// Alias for a result with enriched client error.
pub type EnrichedClientResult<T> = Result<T, EnrichedClientError>;

impl EnrichedClientError {
    pub fn new(inner_error: ClientError, method: &'static str) -> Self {
        Self {
            inner_error,
            method,
            args: HashMap::new(),
        }
    }

    /// Creates an error not originating from the transport, e.g. a malformed response.
    pub fn custom(message: impl Into<String>, method: &'static str) -> Self {
        Self::new(ClientError::Custom(message.into()), method)
    }

    #[must_use]
    pub fn with_arg(mut self, name: &'static str, value: &dyn fmt::Debug) -> Self {
        self.args.insert(name, format!("{value:?}"));
        self
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Whether the error is likely to go away on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.inner_error,
            ClientError::Transport(_) | ClientError::RequestTimeout
        )
    }
}

impl AsRef<ClientError> for EnrichedClientError {
    fn as_ref(&self) -> &ClientError {
        &self.inner_error
    }
}

impl std::error::Error for EnrichedClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner_error)
    }
}

impl fmt::Display for EnrichedClientError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(formatter, "JSON-RPC request {}() failed: {}", self.method, self.inner_error)
        } else {
            let mut args: Vec<_> = self.args.iter().collect();
            args.sort_unstable_by_key(|(name, _)| **name);
            let args = args
                .into_iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(
                formatter,
                "JSON-RPC request {}({args}) failed: {}",
                self.method, self.inner_error
            )
        }
    }
}

pin_project_lite::pin_project! {
    /// Future returned by [`ClientRpcContext::rpc_context()`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless polled"]
    pub struct ClientCallWrapper<F> {
        #[pin]
        inner: F,
        method: &'static str,
        args: HashMap<&'static str, String>,
    }
}

impl<F> ClientCallWrapper<F> {
    pub fn with_arg(mut self, name: &'static str, value: &dyn fmt::Debug) -> Self {
        self.args.insert(name, format!("{value:?}"));
        self
    }
}

impl<T, F> Future for ClientCallWrapper<F>
where
    F: Future<Output = Result<T, ClientError>>,
{
    type Output = EnrichedClientResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> task::Poll<Self::Output> {
        let projection = self.project();
        match projection.inner.poll(cx) {
            task::Poll::Pending => task::Poll::Pending,
            task::Poll::Ready(Ok(value)) => task::Poll::Ready(Ok(value)),
            task::Poll::Ready(Err(err)) => task::Poll::Ready(Err(EnrichedClientError {
                inner_error: err,
                method: projection.method,
                args: mem::take(projection.args),
            })),
        }
    }
}

/// Extension trait attaching the RPC method name (and, optionally, arguments) to client errors.
pub trait ClientRpcContext: Sized {
    fn rpc_context(self, method: &'static str) -> ClientCallWrapper<Self>;
}

impl<T, F> ClientRpcContext for F
where
    F: Future<Output = Result<T, ClientError>>,
{
    fn rpc_context(self, method: &'static str) -> ClientCallWrapper<Self> {
        ClientCallWrapper {
            inner: self,
            method,
            args: HashMap::new(),
        }
    }
}

/// Arguments for calling a function in an unspecified Ethereum smart contract.
#[derive(Debug, Clone)]
pub struct CallFunctionArgs {
    pub(crate) name: String,
    pub(crate) block: Option<BlockId>,
    pub(crate) params: Vec<ethabi::Token>,
}

impl CallFunctionArgs {
    pub fn new(name: &str, params: impl Tokenize) -> Self {
        Self {
            name: name.to_owned(),
            block: None,
            params: params.into_tokens(),
        }
    }

    /// Pins the call to the state at the specified block.
    pub fn with_block(mut self, block: impl Into<BlockId>) -> Self {
        self.block = Some(block.into());
        self
    }

    pub fn for_contract(
        self,
        contract_address: Address,
        contract_abi: &ethabi::Contract,
    ) -> ContractCall {
        ContractCall {
            contract_address,
            contract_abi: contract_abi.clone(),
            inner: self,
        }
    }
}

/// Information sufficient for calling a function in a specific Ethereum smart contract. Instantiated
/// using [`CallFunctionArgs::for_contract()`].
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub(crate) contract_address: Address,
    pub(crate) contract_abi: ethabi::Contract,
    pub(crate) inner: CallFunctionArgs,
}

impl ContractCall {
    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn function_name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the ABI-encoded calldata of the call.
    pub fn encode_input(&self) -> Result<Vec<u8>, ContractCallError> {
        let function = self
            .contract_abi
            .function(&self.inner.name)
            .map_err(ContractCallError::Function)?;
        function
            .encode_input(&self.inner.params)
            .map_err(ContractCallError::EncodeInput)
    }

    /// Converts the call into a request that can be used for `eth_call` or `eth_estimateGas`.
    pub fn to_call_request(&self) -> Result<CallRequest, ContractCallError> {
        Ok(CallRequest {
            to: Some(self.contract_address),
            data: Some(Bytes(self.encode_input()?)),
            ..CallRequest::default()
        })
    }

    /// Executes the call using `eth_call` and decodes its output.
    pub async fn call<R: Detokenize>(&self, client: &dyn EthInterface) -> Result<R, ContractCallError> {
        let function = self
            .contract_abi
            .function(&self.inner.name)
            .map_err(ContractCallError::Function)?;
        let request = self.to_call_request()?;
        let output = client
            .call_contract_function(request, self.inner.block)
            .await?;
        let output_tokens = function
            .decode_output(&output.0)
            .map_err(ContractCallError::DecodeOutput)?;
        Ok(R::from_tokens(output_tokens)?)
    }
}

/// Errors that can occur while calling a contract function.
#[derive(Debug, thiserror::Error)]
pub enum ContractCallError {
    #[error("failed resolving contract function: {0}")]
    Function(#[source] ethabi::Error),
    #[error("failed encoding contract function input: {0}")]
    EncodeInput(#[source] ethabi::Error),
    #[error("failed decoding contract function output: {0}")]
    DecodeOutput(#[source] ethabi::Error),
    #[error("failed converting contract function output: {0}")]
    Detokenize(#[from] abi::Error),
    #[error(transparent)]
    EthereumGateway(#[from] EnrichedClientError),
}

/// Errors that can occur while signing a transaction.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Max fee {0} less than priority fee {1}")]
    WrongFeeProvided(U256, U256),
    #[error("Transaction signing failed: {0}")]
    Signer(#[from] SignerError),
    #[error(transparent)]
    EthereumGateway(#[from] EnrichedClientError),
}

/// Transaction parameters that can be overridden when signing a transaction. Unset values
/// are filled in by the signing client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    pub gas: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub nonce: Option<U256>,
    pub value: Option<U256>,
}

/// Raw transaction bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransactionBytes(pub(crate) Vec<u8>);

impl AsRef<[u8]> for RawTransactionBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Representation of a signed transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedCallResult {
    pub raw_tx: RawTransactionBytes,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub nonce: U256,
    pub hash: H256,
}

/// State of the executed Ethereum transaction.
#[derive(Debug, Clone)]
pub struct ExecutedTxStatus {
    pub tx_hash: H256,
    /// Whether transaction was executed successfully or reverted.
    pub success: bool,
    pub receipt: TransactionReceipt,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use stader_basic_types::{abi::Tokenizable, L1BlockNumber};

    use super::*;

    #[test]
    fn call_is_encoded_for_contract_function() {
        let contract = stader_contracts::network_prices_contract();
        let params = (U256::from(100), U256::from(2), U256::from(3));
        let call = CallFunctionArgs::new("submitPrices", params)
            .with_block(L1BlockNumber(5))
            .for_contract(Address::repeat_byte(1), contract);
        let data = call.encode_input().unwrap();
        assert_eq!(data.len(), 4 + 3 * 32);
        assert_eq!(&data[..4], &contract.function("submitPrices").unwrap().short_signature());

        let request = call.to_call_request().unwrap();
        assert_eq!(request.to, Some(Address::repeat_byte(1)));
        assert_eq!(request.data.unwrap().0, data);
    }

    #[test]
    fn encoding_unknown_function_fails() {
        let call = CallFunctionArgs::new("getNothing", ())
            .for_contract(Address::zero(), stader_contracts::network_prices_contract());
        assert_matches!(call.encode_input(), Err(ContractCallError::Function(_)));

        let call = CallFunctionArgs::new("submitPrices", true.into_token())
            .for_contract(Address::zero(), stader_contracts::network_prices_contract());
        assert_matches!(call.encode_input(), Err(ContractCallError::EncodeInput(_)));
    }

    #[test]
    fn enriched_error_display() {
        let err = EnrichedClientError::custom("boom", "eth_call")
            .with_arg("block", &5_u64)
            .with_arg("address", &"0x01");
        assert_eq!(
            err.to_string(),
            "JSON-RPC request eth_call(address=\"0x01\", block=5) failed: Custom error: boom"
        );
        assert!(!err.is_retryable());
    }
}
