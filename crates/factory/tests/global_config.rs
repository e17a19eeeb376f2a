use elif_factory::{
    attributes, factory_config, set_factory_config, FactoryConfig, FactoryError, ModelFactory,
    ModelSchema,
};

// Mutates the process-wide config
#[test]
fn test_new_factories_read_global_config() {
    set_factory_config(FactoryConfig::default().with_max_batch_size(5).with_seed(7));
    assert_eq!(factory_config().max_batch_size, 5);

    let factory = ModelFactory::define(ModelSchema::new("Tag", "tags"), |ctx| {
        Ok(attributes! { "name" => ctx.faker.word() })
    });
    assert_eq!(factory.config().seed, Some(7));

    let err = factory.build().make_many(6).unwrap_err();
    assert!(matches!(err, FactoryError::BatchLimit { requested: 6, max: 5 }));

    let first = factory.build().make().unwrap();
    let second = factory.build().make().unwrap();
    assert_eq!(first.get("name"), second.get("name"));

    // Per-factory overrides win over the global config
    let relaxed = factory.with_config(FactoryConfig::default());
    assert_eq!(relaxed.build().make_many(6).unwrap().len(), 6);
}
