//! Terraform mappers for the AWS catalog.

use indexmap::IndexMap;
use serde_json::Value;

use stratus_core::Resource;

use crate::block::{AttrValue, CodeBlock};
use crate::error::{IacError, IacResult};
use crate::registry::{CodegenRegistry, MapContext};

use super::ENGINE;

type MapFn = fn(&Resource, &MapContext<'_>) -> IacResult<Vec<CodeBlock>>;

/// Catalog type, Terraform resource type, mapper.
const MAPPERS: &[(&str, &str, MapFn)] = &[
    ("VPC", "aws_vpc", vpc),
    ("Subnet", "aws_subnet", subnet),
    ("InternetGateway", "aws_internet_gateway", internet_gateway),
    ("NATGateway", "aws_nat_gateway", nat_gateway),
    ("ElasticIP", "aws_eip", elastic_ip),
    ("RouteTable", "aws_route_table", route_table),
    ("LoadBalancer", "aws_lb", load_balancer),
    ("Route53Zone", "aws_route53_zone", route53_zone),
    ("SecurityGroup", "aws_security_group", security_group),
    ("IAMRole", "aws_iam_role", iam_role),
    ("EC2", "aws_instance", instance),
    ("Lambda", "aws_lambda_function", lambda_function),
    ("EBSVolume", "aws_ebs_volume", ebs_volume),
    ("S3", "aws_s3_bucket", s3_bucket),
    ("RDS", "aws_db_instance", db_instance),
    ("DynamoDB", "aws_dynamodb_table", dynamodb_table),
    ("SQS", "aws_sqs_queue", sqs_queue),
    ("SNS", "aws_sns_topic", sns_topic),
];

const LAMBDA_BASIC_EXECUTION: &str = "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Register a Terraform mapper for every AWS catalog type.
pub fn register(registry: &mut CodegenRegistry) {
    for (type_name, _, mapper) in MAPPERS {
        registry.register_mapper(ENGINE, *type_name, *mapper);
    }
}

/// Terraform resource type for a catalog type name.
pub fn resource_kind(type_name: &str) -> Option<&'static str> {
    MAPPERS
        .iter()
        .find(|(name, _, _)| *name == type_name)
        .map(|(_, kind, _)| *kind)
}

fn local<'a>(ctx: &MapContext<'a>, resource: &Resource) -> IacResult<&'a str> {
    ctx.local_name(&resource.id)
        .ok_or_else(|| IacError::mapping(&resource.id, "no identifier assigned"))
}

/// `<kind>.<name>.<attribute>` for another mapped resource.
fn reference(ctx: &MapContext<'_>, target: &Resource, attribute: &str) -> IacResult<AttrValue> {
    let kind = resource_kind(&target.type_name).ok_or_else(|| {
        IacError::mapping(&target.id, format!("no Terraform resource type for {}", target.type_name))
    })?;
    let name = local(ctx, target)?;
    Ok(AttrValue::reference(format!("{}.{}.{}", kind, name, attribute)))
}

fn optional_reference(
    ctx: &MapContext<'_>,
    target: Option<&Resource>,
    attribute: &str,
) -> IacResult<Option<AttrValue>> {
    target.map(|t| reference(ctx, t, attribute)).transpose()
}

fn references(ctx: &MapContext<'_>, targets: &[&Resource], attribute: &str) -> IacResult<Vec<AttrValue>> {
    targets.iter().map(|t| reference(ctx, t, attribute)).collect()
}

fn required_ancestor<'a>(ctx: &MapContext<'a>, resource: &Resource, type_name: &str) -> IacResult<&'a Resource> {
    ctx.ancestor(resource, type_name).ok_or_else(|| {
        IacError::mapping(
            &resource.id,
            format!("a {} must be placed inside a {}", resource.type_name, type_name),
        )
    })
}

fn config_str(resource: &Resource, key: &str) -> Option<String> {
    resource.config_str(key).map(str::to_string)
}

fn config_u64(resource: &Resource, key: &str) -> Option<u64> {
    match resource.config.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn config_bool(resource: &Resource, key: &str) -> Option<bool> {
    match resource.config.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `Name` plus any user tags from the resource's `tags` metadata.
fn tags(resource: &Resource) -> AttrValue {
    let mut tags = IndexMap::new();
    tags.insert("Name".to_string(), AttrValue::from(resource.name.as_str()));
    if let Some(Value::Object(extra)) = resource.config.get("tags") {
        for (key, value) in extra {
            if let Some(value) = AttrValue::from_json(value) {
                tags.insert(key.clone(), value);
            }
        }
    }
    AttrValue::Map(tags)
}

fn hyphenated(name: &str) -> String {
    name.replace('_', "-")
}

fn string_variable(name: &str, description: String) -> CodeBlock {
    CodeBlock::variable(name)
        .attr("description", description)
        .attr("type", AttrValue::reference("string"))
}

fn vpc(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let name = local(ctx, resource)?;
    let block = CodeBlock::resource("aws_vpc", name)
        .attr("cidr_block", config_str(resource, "cidr").unwrap_or_else(|| "10.0.0.0/16".to_string()))
        .attr("enable_dns_support", true)
        .attr("enable_dns_hostnames", true)
        .attr("tags", tags(resource));
    let output = CodeBlock::output(format!("{}_id", name))
        .attr("description", format!("ID of VPC {}", resource.name))
        .attr("value", reference(ctx, resource, "id")?);
    Ok(vec![block, output])
}

fn subnet(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let vpc = required_ancestor(ctx, resource, "VPC")?;
    Ok(vec![CodeBlock::resource("aws_subnet", local(ctx, resource)?)
        .attr("vpc_id", reference(ctx, vpc, "id")?)
        .attr("cidr_block", config_str(resource, "cidr").unwrap_or_else(|| "10.0.1.0/24".to_string()))
        .attr_opt("availability_zone", config_str(resource, "availability_zone"))
        .attr_opt("map_public_ip_on_launch", config_bool(resource, "public"))
        .attr("tags", tags(resource))])
}

fn internet_gateway(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    Ok(vec![CodeBlock::resource("aws_internet_gateway", local(ctx, resource)?)
        .attr_opt("vpc_id", optional_reference(ctx, ctx.ancestor(resource, "VPC"), "id")?)
        .attr("tags", tags(resource))])
}

fn nat_gateway(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let eip = ctx.children(resource, "ElasticIP").into_iter().next();
    let mut block = CodeBlock::resource("aws_nat_gateway", local(ctx, resource)?)
        .attr_opt("allocation_id", optional_reference(ctx, eip, "id")?)
        .attr_opt("subnet_id", optional_reference(ctx, ctx.ancestor(resource, "Subnet"), "id")?);
    if eip.is_none() {
        block.set("connectivity_type", "private");
    }
    Ok(vec![block.attr("tags", tags(resource))])
}

fn elastic_ip(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    Ok(vec![CodeBlock::resource("aws_eip", local(ctx, resource)?)
        .attr("domain", "vpc")
        .attr("tags", tags(resource))])
}

fn route_table(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let vpc = required_ancestor(ctx, resource, "VPC")?;
    Ok(vec![CodeBlock::resource("aws_route_table", local(ctx, resource)?)
        .attr("vpc_id", reference(ctx, vpc, "id")?)
        .attr("tags", tags(resource))])
}

fn load_balancer(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let name = local(ctx, resource)?;

    let mut subnets = ctx.dependencies(resource, "Subnet");
    if let Some(parent) = ctx.ancestor(resource, "Subnet") {
        if !subnets.iter().any(|s| s.id == parent.id) {
            subnets.insert(0, parent);
        }
    }
    let subnets = references(ctx, &subnets, "id")?;
    let groups = references(ctx, &ctx.dependencies(resource, "SecurityGroup"), "id")?;

    let mut block = CodeBlock::resource("aws_lb", name)
        .attr("name", hyphenated(name).chars().take(32).collect::<String>())
        .attr("internal", config_bool(resource, "internal").unwrap_or(false))
        .attr(
            "load_balancer_type",
            config_str(resource, "load_balancer_type").unwrap_or_else(|| "application".to_string()),
        );
    if !subnets.is_empty() {
        block.set("subnets", AttrValue::List(subnets));
    }
    if !groups.is_empty() {
        block.set("security_groups", AttrValue::List(groups));
    }
    Ok(vec![block.attr("tags", tags(resource))])
}

fn route53_zone(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    Ok(vec![CodeBlock::resource("aws_route53_zone", local(ctx, resource)?)
        .attr("name", config_str(resource, "domain").unwrap_or_else(|| resource.name.clone()))
        .attr("tags", tags(resource))])
}

fn security_group(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let mut block = CodeBlock::resource("aws_security_group", local(ctx, resource)?)
        .attr("name", resource.name.as_str())
        .attr(
            "description",
            config_str(resource, "description").unwrap_or_else(|| format!("Security group {}", resource.name)),
        )
        .attr_opt("vpc_id", optional_reference(ctx, ctx.ancestor(resource, "VPC"), "id")?);

    let ports = match resource.config.get("ingress_ports") {
        Some(Value::Array(ports)) => ports.iter().filter_map(Value::as_u64).collect(),
        _ => Vec::new(),
    };
    for port in ports {
        block = block.block(
            CodeBlock::new("ingress")
                .attr("from_port", port)
                .attr("to_port", port)
                .attr("protocol", "tcp")
                .attr("cidr_blocks", vec!["0.0.0.0/0"]),
        );
    }
    block = block.block(
        CodeBlock::new("egress")
            .attr("from_port", 0u64)
            .attr("to_port", 0u64)
            .attr("protocol", "-1")
            .attr("cidr_blocks", vec!["0.0.0.0/0"]),
    );

    Ok(vec![block.attr("tags", tags(resource))])
}

fn iam_role(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let name = local(ctx, resource)?;
    let service = ctx
        .dependents(resource)
        .iter()
        .find_map(|r| match r.type_name.as_str() {
            "Lambda" => Some("lambda.amazonaws.com"),
            "EC2" => Some("ec2.amazonaws.com"),
            _ => None,
        })
        .or_else(|| resource.config_str("service"))
        .unwrap_or("lambda.amazonaws.com")
        .to_string();

    let policy = format!(
        r#"jsonencode({{ Version = "2012-10-17", Statement = [{{ Action = "sts:AssumeRole", Effect = "Allow", Principal = {{ Service = "{}" }} }}] }})"#,
        service
    );
    let mut blocks = vec![CodeBlock::resource("aws_iam_role", name)
        .attr("name", resource.name.as_str())
        .attr("assume_role_policy", AttrValue::reference(policy))
        .attr("tags", tags(resource))];

    if service == "lambda.amazonaws.com" {
        blocks.push(
            CodeBlock::resource("aws_iam_role_policy_attachment", format!("{}_basic_execution", name))
                .attr("role", reference(ctx, resource, "name")?)
                .attr("policy_arn", LAMBDA_BASIC_EXECUTION),
        );
    }
    Ok(blocks)
}

fn instance(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let name = local(ctx, resource)?;
    let mut blocks = Vec::new();

    let ami = match config_str(resource, "ami") {
        Some(ami) => AttrValue::from(ami),
        None => {
            let variable = format!("{}_ami", name);
            blocks.push(string_variable(&variable, format!("AMI for instance {}", resource.name)));
            AttrValue::reference(format!("var.{}", variable))
        }
    };
    let groups = references(ctx, &ctx.dependencies(resource, "SecurityGroup"), "id")?;

    let mut block = CodeBlock::resource("aws_instance", name)
        .attr("ami", ami)
        .attr(
            "instance_type",
            config_str(resource, "instance_type").unwrap_or_else(|| "t3.micro".to_string()),
        )
        .attr_opt("subnet_id", optional_reference(ctx, ctx.ancestor(resource, "Subnet"), "id")?);
    if !groups.is_empty() {
        block.set("vpc_security_group_ids", AttrValue::List(groups));
    }
    blocks.insert(0, block.attr("tags", tags(resource)));

    Ok(blocks)
}

fn lambda_function(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let name = local(ctx, resource)?;

    let role = match config_str(resource, "role_arn") {
        Some(arn) => AttrValue::from(arn),
        None => {
            let role = ctx
                .dependencies(resource, "IAMRole")
                .into_iter()
                .next()
                .ok_or_else(|| IacError::mapping(&resource.id, "a Lambda needs an IAM role or a role_arn"))?;
            reference(ctx, role, "arn")?
        }
    };

    let mut variables = IndexMap::new();
    for target in resource.dependency_targets().filter_map(|id| ctx.resource(id)) {
        let (suffix, attribute) = match target.type_name.as_str() {
            "S3" => ("BUCKET", "bucket"),
            "SQS" => ("QUEUE_URL", "url"),
            "SNS" => ("TOPIC_ARN", "arn"),
            "DynamoDB" => ("TABLE_NAME", "name"),
            _ => continue,
        };
        let key = format!("{}_{}", local(ctx, target)?.to_uppercase(), suffix);
        variables.insert(key, reference(ctx, target, attribute)?);
    }

    let mut block = CodeBlock::resource("aws_lambda_function", name)
        .attr("function_name", resource.name.as_str())
        .attr("role", role)
        .attr("runtime", config_str(resource, "runtime").unwrap_or_else(|| "python3.12".to_string()))
        .attr("handler", config_str(resource, "handler").unwrap_or_else(|| "index.handler".to_string()))
        .attr("filename", config_str(resource, "filename").unwrap_or_else(|| format!("{}.zip", name)))
        .attr("tags", tags(resource));
    if !variables.is_empty() {
        block = block.block(CodeBlock::new("environment").attr("variables", AttrValue::Map(variables)));
    }

    Ok(vec![block])
}

/// `/dev/sdf` onwards, wrapping after `/dev/sdp`.
fn device_name(index: usize) -> String {
    let letter = (b'f' + (index % 11) as u8) as char;
    format!("/dev/sd{}", letter)
}

fn ebs_volume(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let name = local(ctx, resource)?;
    let instance = resource
        .parent()
        .and_then(|id| ctx.resource(id))
        .filter(|parent| parent.type_name == "EC2");

    let size = config_u64(resource, "size_gb")
        .or_else(|| instance.and_then(|i| config_u64(i, "extra_volume_gb")))
        .unwrap_or(20);
    let zone = match instance {
        Some(instance) => reference(ctx, instance, "availability_zone")?,
        None => AttrValue::from(
            config_str(resource, "availability_zone")
                .unwrap_or_else(|| format!("{}a", ctx.architecture.region)),
        ),
    };

    let mut blocks = vec![CodeBlock::resource("aws_ebs_volume", name)
        .attr("availability_zone", zone)
        .attr("size", size)
        .attr("type", config_str(resource, "volume_type").unwrap_or_else(|| "gp3".to_string()))
        .attr("tags", tags(resource))];

    if let Some(instance) = instance {
        let index = ctx
            .children(instance, "EBSVolume")
            .iter()
            .position(|v| v.id == resource.id)
            .unwrap_or(0);
        blocks.push(
            CodeBlock::resource("aws_volume_attachment", format!("{}_attachment", name))
                .attr("device_name", device_name(index))
                .attr("volume_id", reference(ctx, resource, "id")?)
                .attr("instance_id", reference(ctx, instance, "id")?),
        );
    }

    Ok(blocks)
}

fn s3_bucket(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let name = local(ctx, resource)?;
    let block = CodeBlock::resource("aws_s3_bucket", name)
        .attr("bucket", config_str(resource, "bucket_name").unwrap_or_else(|| hyphenated(name)))
        .attr("tags", tags(resource));
    let output = CodeBlock::output(format!("{}_arn", name))
        .attr("description", format!("ARN of bucket {}", resource.name))
        .attr("value", reference(ctx, resource, "arn")?);
    Ok(vec![block, output])
}

fn db_instance(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let name = local(ctx, resource)?;
    let password = format!("{}_password", name);
    let groups = references(ctx, &ctx.dependencies(resource, "SecurityGroup"), "id")?;

    let mut block = CodeBlock::resource("aws_db_instance", name)
        .attr("identifier", hyphenated(name))
        .attr("engine", config_str(resource, "engine").unwrap_or_else(|| "postgres".to_string()))
        .attr_opt("engine_version", config_str(resource, "engine_version"))
        .attr(
            "instance_class",
            config_str(resource, "instance_class").unwrap_or_else(|| "db.t3.micro".to_string()),
        )
        .attr("allocated_storage", config_u64(resource, "storage_gb").unwrap_or(20))
        .attr("username", config_str(resource, "username").unwrap_or_else(|| "stratus".to_string()))
        .attr("password", AttrValue::reference(format!("var.{}", password)))
        .attr("skip_final_snapshot", true);
    if !groups.is_empty() {
        block.set("vpc_security_group_ids", AttrValue::List(groups));
    }

    let variable = string_variable(&password, format!("Master password for database {}", resource.name))
        .attr("sensitive", true);

    Ok(vec![block.attr("tags", tags(resource)), variable])
}

fn dynamodb_table(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let hash_key = config_str(resource, "hash_key").unwrap_or_else(|| "id".to_string());
    Ok(vec![CodeBlock::resource("aws_dynamodb_table", local(ctx, resource)?)
        .attr("name", resource.name.as_str())
        .attr("billing_mode", "PAY_PER_REQUEST")
        .attr("hash_key", hash_key.as_str())
        .attr("tags", tags(resource))
        .block(CodeBlock::new("attribute").attr("name", hash_key).attr("type", "S"))])
}

fn sqs_queue(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    let fifo = config_bool(resource, "fifo").unwrap_or(false);
    let mut block = CodeBlock::resource("aws_sqs_queue", local(ctx, resource)?);
    if fifo {
        block = block
            .attr("name", format!("{}.fifo", resource.name))
            .attr("fifo_queue", true);
    } else {
        block = block.attr("name", resource.name.as_str());
    }
    Ok(vec![block.attr("tags", tags(resource))])
}

fn sns_topic(resource: &Resource, ctx: &MapContext<'_>) -> IacResult<Vec<CodeBlock>> {
    Ok(vec![CodeBlock::resource("aws_sns_topic", local(ctx, resource)?)
        .attr("name", resource.name.as_str())
        .attr("tags", tags(resource))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use stratus_core::{Architecture, CloudProvider};
    use stratus_diagram::DependencyType;

    fn names(arch: &Architecture) -> HashMap<String, String> {
        arch.resources
            .iter()
            .map(|r| (r.id.clone(), crate::writer::sanitize_identifier(&r.name)))
            .collect()
    }

    fn contained(mut child: Resource, parent: &mut Resource) -> Resource {
        child.parents.push(parent.id.clone());
        parent.children.push(child.id.clone());
        child
    }

    #[test]
    fn test_resource_kinds() {
        assert_eq!(resource_kind("NATGateway"), Some("aws_nat_gateway"));
        assert_eq!(resource_kind("FooBar"), None);
    }

    #[test]
    fn test_subnet_references_vpc() {
        let mut vpc = Resource::new("v1", "VPC").with_name("main");
        let subnet = contained(Resource::new("s1", "Subnet").with_config("cidr", "10.0.2.0/24"), &mut vpc);
        let arch = Architecture::new(CloudProvider::Aws, "us-east-1")
            .with_resource(vpc)
            .with_resource(subnet);
        let names = names(&arch);
        let ctx = MapContext::new(&arch, ENGINE, &names);

        let blocks = super::subnet(arch.resource("s1").unwrap(), &ctx).unwrap();
        assert_eq!(blocks[0].attributes["vpc_id"], AttrValue::reference("aws_vpc.main.id"));
        assert_eq!(blocks[0].attributes["cidr_block"], AttrValue::from("10.0.2.0/24"));
    }

    #[test]
    fn test_orphan_subnet_is_a_mapping_error() {
        let arch = Architecture::new(CloudProvider::Aws, "us-east-1").with_resource(Resource::new("s1", "Subnet"));
        let names = names(&arch);
        let ctx = MapContext::new(&arch, ENGINE, &names);

        let err = subnet(arch.resource("s1").unwrap(), &ctx).unwrap_err();
        assert!(matches!(err, IacError::Mapping { ref resource, .. } if resource == "s1"));
    }

    #[test]
    fn test_lambda_environment_and_role() {
        let arch = Architecture::new(CloudProvider::Aws, "us-east-1")
            .with_resource(
                Resource::new("fn", "Lambda")
                    .with_name("worker")
                    .depending_on("bucket", DependencyType::Uses)
                    .depending_on("role", DependencyType::DependsOn),
            )
            .with_resource(Resource::new("bucket", "S3").with_name("uploads"))
            .with_resource(Resource::new("role", "IAMRole").with_name("worker-role"));
        let names = names(&arch);
        let ctx = MapContext::new(&arch, ENGINE, &names);

        let blocks = lambda_function(arch.resource("fn").unwrap(), &ctx).unwrap();
        let lambda = &blocks[0];
        assert_eq!(lambda.attributes["role"], AttrValue::reference("aws_iam_role.worker_role.arn"));
        let env = &lambda.blocks[0];
        assert_eq!(env.block_type, "environment");
        match &env.attributes["variables"] {
            AttrValue::Map(vars) => {
                assert_eq!(vars["UPLOADS_BUCKET"], AttrValue::reference("aws_s3_bucket.uploads.bucket"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let role_blocks = iam_role(arch.resource("role").unwrap(), &ctx).unwrap();
        assert_eq!(role_blocks.len(), 2);
        assert_eq!(role_blocks[1].labels[0], "aws_iam_role_policy_attachment");
    }

    #[test]
    fn test_nat_without_eip_is_private() {
        let arch = Architecture::new(CloudProvider::Aws, "us-east-1").with_resource(Resource::new("nat", "NATGateway"));
        let names = names(&arch);
        let ctx = MapContext::new(&arch, ENGINE, &names);

        let blocks = nat_gateway(arch.resource("nat").unwrap(), &ctx).unwrap();
        assert_eq!(blocks[0].attributes["connectivity_type"], AttrValue::from("private"));
        assert!(!blocks[0].attributes.contains_key("allocation_id"));
    }

    #[test]
    fn test_attached_volume() {
        let mut web = Resource::new("web", "EC2").with_config("extra_volume_gb", 100);
        let first = contained(Resource::new("web-ebsvolume-1", "EBSVolume"), &mut web);
        let second = contained(Resource::new("web-ebsvolume-2", "EBSVolume"), &mut web);
        let arch = Architecture::new(CloudProvider::Aws, "us-east-1")
            .with_resource(web)
            .with_resource(first)
            .with_resource(second);
        let names = names(&arch);
        let ctx = MapContext::new(&arch, ENGINE, &names);

        let blocks = ebs_volume(arch.resource("web-ebsvolume-2").unwrap(), &ctx).unwrap();
        assert_eq!(blocks[0].attributes["size"], AttrValue::from(100u64));
        assert_eq!(
            blocks[0].attributes["availability_zone"],
            AttrValue::reference("aws_instance.web.availability_zone")
        );
        assert_eq!(blocks[1].attributes["device_name"], AttrValue::from("/dev/sdg"));
    }

    #[test]
    fn test_instance_ami_variable() {
        let arch = Architecture::new(CloudProvider::Aws, "us-east-1").with_resource(Resource::new("web", "EC2"));
        let names = names(&arch);
        let ctx = MapContext::new(&arch, ENGINE, &names);

        let blocks = instance(arch.resource("web").unwrap(), &ctx).unwrap();
        assert_eq!(blocks[0].block_type, "resource");
        assert_eq!(blocks[1].labels, vec!["web_ami"]);
        assert_eq!(blocks[0].attributes["ami"], AttrValue::reference("var.web_ami"));
    }
}
