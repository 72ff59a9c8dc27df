//! DynamoDB implementation of [`TableStore`].
//!
//! Products are stored as items with the attributes `SKU` (string), `Price` (number) and `Type`
//! (string). The client is built from the standard AWS config chain, optionally pointed at a
//! custom endpoint such as a DynamoDB Local instance on `http://localhost:8000`.

use std::fmt;

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
    PutRequest, ScalarAttributeType, TableDescription, WriteRequest,
};
use skudrive_types::Product;

use crate::common::{BatchWriteResponse, MAX_BATCH_SIZE, TableInfo, TableSchema, TableStore};
use crate::error::{StoreError, StoreResult};

const ATTR_SKU: &str = "SKU";
const ATTR_PRICE: &str = "Price";
const ATTR_TYPE: &str = "Type";

/// Connection settings for [`DynamoDbStore::from_config`].
#[derive(Clone, Debug, Default)]
pub struct DynamoDbStoreConfig {
    /// Custom endpoint URL. Uses the regional AWS endpoint if `None`.
    pub endpoint: Option<String>,
    /// AWS region. Falls back to the standard config chain if `None`.
    pub region: Option<String>,
}

/// A [`TableStore`] backed by Amazon DynamoDB.
#[derive(Clone)]
pub struct DynamoDbStore {
    client: Client,
    endpoint: Option<String>,
}

impl DynamoDbStore {
    /// Creates a store with a pre-built DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: None,
        }
    }

    /// Creates a store from the standard AWS config chain with the given overrides.
    ///
    /// Credentials are resolved from environment variables, AWS profiles or IMDS.
    pub async fn from_config(config: DynamoDbStoreConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = config.region {
            loader = loader.region(Region::new(region));
        }
        if let Some(ref endpoint) = config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        Self {
            client: Client::new(&sdk_config),
            endpoint: config.endpoint,
        }
    }
}

impl fmt::Debug for DynamoDbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoDbStore")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

fn table_info(table: &str, description: Option<&TableDescription>) -> TableInfo {
    TableInfo {
        table: table.to_owned(),
        status: description
            .and_then(|d| d.table_status())
            .map(|s| s.as_str().to_owned()),
    }
}

fn put_request(product: &Product) -> StoreResult<WriteRequest> {
    let put = PutRequest::builder()
        .item(ATTR_SKU, AttributeValue::S(product.sku.to_string()))
        .item(ATTR_PRICE, AttributeValue::N(product.price.to_string()))
        .item(ATTR_TYPE, AttributeValue::S(product.kind.clone()))
        .build()
        .map_err(|e| StoreError::remote("failed to build put request", e))?;

    Ok(WriteRequest::builder().put_request(put).build())
}

#[async_trait::async_trait]
impl TableStore for DynamoDbStore {
    fn name(&self) -> &'static str {
        "dynamodb"
    }

    #[tracing::instrument(level = "trace", skip(self))]
    async fn delete_table(&self, table: &str) -> StoreResult<TableInfo> {
        tracing::debug!("Deleting DynamoDB table");
        match self.client.delete_table().table_name(table).send().await {
            Ok(output) => Ok(table_info(table, output.table_description())),
            Err(err) => {
                if let Some(service_err) = err.as_service_error()
                    && service_err.is_resource_not_found_exception()
                {
                    return Err(StoreError::TableNotFound {
                        table: table.to_owned(),
                    });
                }
                Err(StoreError::remote("failed to delete table", err))
            }
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(table = %schema.table))]
    async fn create_table(&self, schema: &TableSchema) -> StoreResult<TableInfo> {
        tracing::debug!("Creating DynamoDB table");
        let key_schema = KeySchemaElement::builder()
            .attribute_name(&schema.hash_key)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| StoreError::remote("invalid key schema", e))?;
        let attribute = AttributeDefinition::builder()
            .attribute_name(&schema.hash_key)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|e| StoreError::remote("invalid attribute definition", e))?;
        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(schema.read_capacity)
            .write_capacity_units(schema.write_capacity)
            .build()
            .map_err(|e| StoreError::remote("invalid provisioned throughput", e))?;

        let result = self
            .client
            .create_table()
            .table_name(&schema.table)
            .key_schema(key_schema)
            .attribute_definitions(attribute)
            .provisioned_throughput(throughput)
            .send()
            .await;

        match result {
            Ok(output) => Ok(table_info(&schema.table, output.table_description())),
            Err(err) => {
                if let Some(service_err) = err.as_service_error()
                    && service_err.is_resource_in_use_exception()
                {
                    return Err(StoreError::TableExists {
                        table: schema.table.clone(),
                    });
                }
                Err(StoreError::remote("failed to create table", err))
            }
        }
    }

    #[tracing::instrument(level = "trace", skip(self, products), fields(items = products.len()))]
    async fn batch_write(
        &self,
        table: &str,
        products: &[Product],
    ) -> StoreResult<BatchWriteResponse> {
        if products.len() > MAX_BATCH_SIZE {
            return Err(StoreError::BatchTooLarge(products.len()));
        }
        if products.is_empty() {
            return Ok(BatchWriteResponse::default());
        }

        let requests = products
            .iter()
            .map(put_request)
            .collect::<StoreResult<Vec<_>>>()?;

        tracing::debug!("Writing batch to DynamoDB");
        let output = self
            .client
            .batch_write_item()
            .request_items(table, requests)
            .send()
            .await
            .map_err(|e| StoreError::remote("failed to write batch", e))?;

        let unprocessed = output
            .unprocessed_items()
            .and_then(|items| items.get(table))
            .map_or(0, Vec::len);

        Ok(BatchWriteResponse {
            written: products.len() - unprocessed,
            unprocessed,
        })
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials};
    use serde_json::json;
    use skudrive_test::dynamodb::DynamoDbStub;
    use skudrive_types::{Price, Sku};

    use super::*;

    fn stub_store(stub: &DynamoDbStub) -> DynamoDbStore {
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "stub"))
            .endpoint_url(stub.url())
            .build();
        DynamoDbStore::new(Client::from_conf(config))
    }

    fn products(count: u64) -> Vec<Product> {
        (0..count)
            .map(|n| Product::regular(Sku::new(n).unwrap(), Price::MIN))
            .collect()
    }

    #[test]
    fn put_request_carries_all_attributes() {
        let product = Product::regular(Sku::new(12).unwrap(), Price::from_cents(2_599));
        let request = put_request(&product).unwrap();
        let item = request.put_request().unwrap().item();

        assert_eq!(
            item.get(ATTR_SKU),
            Some(&AttributeValue::S("THING-00000012".into()))
        );
        assert_eq!(item.get(ATTR_PRICE), Some(&AttributeValue::N("25.99".into())));
        assert_eq!(item.get(ATTR_TYPE), Some(&AttributeValue::S("Regular".into())));
    }

    #[test]
    fn table_info_without_description() {
        let info = table_info("Products", None);
        assert_eq!(info.table, "Products");
        assert_eq!(info.status, None);
    }

    #[tokio::test]
    async fn delete_reports_table_status() {
        let stub = DynamoDbStub::new().await;
        stub.respond(
            "DeleteTable",
            json!({"TableDescription": {"TableName": "Products", "TableStatus": "DELETING"}}),
        );

        let info = stub_store(&stub).delete_table("Products").await.unwrap();
        assert_eq!(info.table, "Products");
        assert_eq!(info.status.as_deref(), Some("DELETING"));

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "DeleteTable");
        assert_eq!(requests[0].1["TableName"], "Products");
    }

    #[tokio::test]
    async fn delete_missing_table_is_not_found() {
        let stub = DynamoDbStub::new().await;
        stub.fail("DeleteTable", "ResourceNotFoundException");

        let err = stub_store(&stub).delete_table("Products").await.unwrap_err();
        assert!(
            matches!(&err, StoreError::TableNotFound { table } if table == "Products"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn create_sends_schema() {
        let stub = DynamoDbStub::new().await;
        stub.respond(
            "CreateTable",
            json!({"TableDescription": {"TableName": "Products", "TableStatus": "CREATING"}}),
        );

        let info = stub_store(&stub)
            .create_table(&TableSchema::products("Products"))
            .await
            .unwrap();
        assert_eq!(info.status.as_deref(), Some("CREATING"));

        let (operation, request) = stub.requests().remove(0);
        assert_eq!(operation, "CreateTable");
        assert_eq!(request["TableName"], "Products");
        assert_eq!(
            request["KeySchema"],
            json!([{"AttributeName": "SKU", "KeyType": "HASH"}])
        );
        assert_eq!(
            request["AttributeDefinitions"],
            json!([{"AttributeName": "SKU", "AttributeType": "S"}])
        );
        assert_eq!(
            request["ProvisionedThroughput"],
            json!({"ReadCapacityUnits": 1, "WriteCapacityUnits": 1})
        );
    }

    #[tokio::test]
    async fn create_existing_table_is_exists() {
        let stub = DynamoDbStub::new().await;
        stub.fail("CreateTable", "ResourceInUseException");

        let err = stub_store(&stub)
            .create_table(&TableSchema::products("Products"))
            .await
            .unwrap_err();
        assert!(
            matches!(&err, StoreError::TableExists { table } if table == "Products"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn other_service_errors_are_remote() {
        let stub = DynamoDbStub::new().await;
        stub.fail("DeleteTable", "ValidationException");

        let err = stub_store(&stub).delete_table("Products").await.unwrap_err();
        assert!(matches!(err, StoreError::Remote { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn batch_counts_unprocessed_items() {
        let stub = DynamoDbStub::new().await;
        stub.respond(
            "BatchWriteItem",
            json!({"UnprocessedItems": {"Products": [{"PutRequest": {"Item": {
                "SKU": {"S": "THING-00000002"},
                "Price": {"N": "10.00"},
                "Type": {"S": "Regular"},
            }}}]}}),
        );

        let response = stub_store(&stub)
            .batch_write("Products", &products(3))
            .await
            .unwrap();
        assert_eq!(
            response,
            BatchWriteResponse {
                written: 2,
                unprocessed: 1
            }
        );

        let (operation, request) = stub.requests().remove(0);
        assert_eq!(operation, "BatchWriteItem");
        let puts = request["RequestItems"]["Products"].as_array().unwrap();
        assert_eq!(puts.len(), 3);
        assert_eq!(
            puts[0]["PutRequest"]["Item"]["SKU"],
            json!({"S": "THING-00000000"})
        );
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_locally() {
        let stub = DynamoDbStub::new().await;

        let err = stub_store(&stub)
            .batch_write("Products", &products(MAX_BATCH_SIZE as u64 + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::BatchTooLarge(26)));
        assert!(stub.requests().is_empty());
    }
}
