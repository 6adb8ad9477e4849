//! AWS resource type catalog.

use crate::hidden::HiddenDependencyRule;
use crate::provider::CloudProvider;
use crate::registry::ResourceTypeRegistry;
use crate::resource_type::{ResourceCategory, ResourceType};

const PROVIDER: CloudProvider = CloudProvider::Aws;

fn regional(name: &str, category: ResourceCategory, kind: &str) -> ResourceType {
    ResourceType::regional(name, category, kind, PROVIDER)
}

fn global(name: &str, category: ResourceCategory, kind: &str) -> ResourceType {
    ResourceType::global(name, category, kind, PROVIDER)
}

/// Register the AWS catalog.
pub fn register(registry: &mut ResourceTypeRegistry) {
    use ResourceCategory::*;

    // Networking
    registry.register(regional("VPC", Networking, "vpc"), Vec::new());
    registry.register(regional("Subnet", Networking, "subnet"), Vec::new());
    registry.register(regional("InternetGateway", Networking, "internet_gateway"), Vec::new());
    registry.register(
        regional("NATGateway", Networking, "nat_gateway"),
        vec![HiddenDependencyRule::new("aws", "NATGateway", "ElasticIP").attached()],
    );
    registry.register(regional("ElasticIP", Networking, "eip"), Vec::new());
    registry.register(regional("RouteTable", Networking, "route_table"), Vec::new());
    registry.register(regional("LoadBalancer", Networking, "lb"), Vec::new());
    registry.register(global("Route53Zone", Networking, "route53_zone"), Vec::new());

    // Security
    registry.register(regional("SecurityGroup", Security, "security_group"), Vec::new());
    registry.register(global("IAMRole", Security, "iam_role"), Vec::new());

    // Compute
    registry.register(
        regional("EC2", Compute, "instance"),
        vec![HiddenDependencyRule::new("aws", "EC2", "EBSVolume")
            .attached()
            .with_condition("metadata.extra_volume_gb > 0")
            .with_quantity("metadata.extra_volume_count ?? 1")],
    );
    registry.register(
        regional("Lambda", Compute, "lambda_function"),
        vec![HiddenDependencyRule::new("aws", "Lambda", "IAMRole").with_condition("metadata.role_arn == null")],
    );

    // Storage
    registry.register(regional("EBSVolume", Storage, "ebs_volume"), Vec::new());
    registry.register(global("S3", Storage, "s3_bucket"), Vec::new());

    // Databases
    registry.register(regional("RDS", Database, "db_instance"), Vec::new());
    registry.register(regional("DynamoDB", Database, "dynamodb_table"), Vec::new());

    // Messaging
    registry.register(regional("SQS", Messaging, "sqs_queue"), Vec::new());
    registry.register(regional("SNS", Messaging, "sns_topic"), Vec::new());
}
