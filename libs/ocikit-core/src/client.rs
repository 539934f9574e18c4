use crate::models::Vcn;
use crate::subnet::{
    CREATE_SUBNET, CreateSubnetRequest, CreateSubnetResponse, DELETE_SUBNET, DeleteSubnetRequest,
    DeleteSubnetResponse, GET_SUBNET, GetSubnetRequest, GetSubnetResponse,
};
use crate::vcn::{
    CHANGE_VCN_COMPARTMENT, CREATE_VCN, ChangeVcnCompartmentRequest, ChangeVcnCompartmentResponse,
    CreateVcnRequest, CreateVcnResponse, DELETE_VCN, DeleteVcnRequest, DeleteVcnResponse, GET_VCN,
    GetVcnRequest, GetVcnResponse, LIST_VCNS, ListVcnsRequest, ListVcnsResponse, UPDATE_VCN,
    UpdateVcnRequest, UpdateVcnResponse,
};
use futures_core::Stream;
use ocikit_common::{CallContext, ClientConfig, Dispatcher, ItemsPager, OciError, Page};

/// Client for the virtual network part of the core services API.
///
/// Cheap to clone; clones share one HTTP connection pool.
#[derive(Debug, Clone)]
pub struct VirtualNetworkClient {
    dispatcher: Dispatcher,
}

impl VirtualNetworkClient {
    /// Service name in the regional endpoint host
    pub const SERVICE: &'static str = "iaas";
    /// API version prefix of every operation path
    pub const BASE_PATH: &'static str = "/20160918";

    /// Build a client with its own HTTPS transport.
    ///
    /// # Errors
    /// Returns `OciError::Config` when no endpoint can be derived and
    /// `OciError::Transport` when the transport cannot be initialized.
    pub fn new(config: &ClientConfig) -> Result<Self, OciError> {
        let dispatcher = config.build_dispatcher(Self::SERVICE, Self::BASE_PATH)?;
        tracing::debug!(endpoint = dispatcher.endpoint().base_url(), "Virtual network client ready");
        Ok(Self { dispatcher })
    }

    /// Use an existing dispatcher, e.g. one sharing a transport with other clients.
    #[must_use]
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// # Errors
    /// See [`Dispatcher::call`].
    pub async fn list_vcns(
        &self,
        ctx: &CallContext,
        request: &ListVcnsRequest,
    ) -> Result<ListVcnsResponse, OciError> {
        self.dispatcher.call(ctx, &LIST_VCNS, request).await
    }

    /// Every VCN matching `request`, following `opc-next-page` until the last page.
    ///
    /// `request.page` is the starting point; errors end the stream.
    #[must_use]
    pub fn list_all_vcns(
        &self,
        ctx: &CallContext,
        request: ListVcnsRequest,
    ) -> impl Stream<Item = Result<Vcn, OciError>> + use<> {
        let client = self.clone();
        let ctx = ctx.clone();
        let mut start = request.page.clone();

        ItemsPager::new(move |page: Option<String>| {
            let client = client.clone();
            let ctx = ctx.clone();
            let mut request = request.clone();
            request.page = page.or_else(|| start.take());
            async move {
                tracing::trace!(page = request.page.as_deref(), "Fetching VCN page");
                let resp = client.list_vcns(&ctx, &request).await?;
                Ok(Page::new(resp.items, resp.opc_next_page))
            }
        })
    }

    /// # Errors
    /// See [`Dispatcher::call`].
    pub async fn get_vcn(
        &self,
        ctx: &CallContext,
        request: &GetVcnRequest,
    ) -> Result<GetVcnResponse, OciError> {
        self.dispatcher.call(ctx, &GET_VCN, request).await
    }

    /// # Errors
    /// See [`Dispatcher::call`].
    pub async fn create_vcn(
        &self,
        ctx: &CallContext,
        request: &CreateVcnRequest,
    ) -> Result<CreateVcnResponse, OciError> {
        self.dispatcher.call(ctx, &CREATE_VCN, request).await
    }

    /// # Errors
    /// See [`Dispatcher::call`].
    pub async fn update_vcn(
        &self,
        ctx: &CallContext,
        request: &UpdateVcnRequest,
    ) -> Result<UpdateVcnResponse, OciError> {
        self.dispatcher.call(ctx, &UPDATE_VCN, request).await
    }

    /// # Errors
    /// See [`Dispatcher::call`].
    pub async fn delete_vcn(
        &self,
        ctx: &CallContext,
        request: &DeleteVcnRequest,
    ) -> Result<DeleteVcnResponse, OciError> {
        self.dispatcher.call(ctx, &DELETE_VCN, request).await
    }

    /// Move a VCN to another compartment. Completion is reported through the
    /// returned work request id.
    ///
    /// # Errors
    /// See [`Dispatcher::call`].
    pub async fn change_vcn_compartment(
        &self,
        ctx: &CallContext,
        request: &ChangeVcnCompartmentRequest,
    ) -> Result<ChangeVcnCompartmentResponse, OciError> {
        self.dispatcher
            .call(ctx, &CHANGE_VCN_COMPARTMENT, request)
            .await
    }

    /// # Errors
    /// See [`Dispatcher::call`].
    pub async fn get_subnet(
        &self,
        ctx: &CallContext,
        request: &GetSubnetRequest,
    ) -> Result<GetSubnetResponse, OciError> {
        self.dispatcher.call(ctx, &GET_SUBNET, request).await
    }

    /// # Errors
    /// See [`Dispatcher::call`].
    pub async fn create_subnet(
        &self,
        ctx: &CallContext,
        request: &CreateSubnetRequest,
    ) -> Result<CreateSubnetResponse, OciError> {
        self.dispatcher.call(ctx, &CREATE_SUBNET, request).await
    }

    /// # Errors
    /// See [`Dispatcher::call`].
    pub async fn delete_subnet(
        &self,
        ctx: &CallContext,
        request: &DeleteSubnetRequest,
    ) -> Result<DeleteSubnetResponse, OciError> {
        self.dispatcher.call(ctx, &DELETE_SUBNET, request).await
    }
}
